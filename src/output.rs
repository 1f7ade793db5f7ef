//! Console and process-environment capabilities.
//!
//! The controller never touches stdout or `std::env` directly; it receives
//! an [`OutputStream`] and a [`ProcessEnv`] so hosts (and tests) decide where
//! diagnostics land and what "current directory" means.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Line-oriented console abstraction consumed by the core.
pub trait OutputStream: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Ambient process state, injected instead of read globally.
pub trait ProcessEnv: Send + Sync {
    fn cwd(&self) -> PathBuf;
}

/// Output line routing for the stdout/stderr writer task.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Real console: a blocking writer task behind an unbounded channel so async
/// tasks never block on terminal I/O.
pub struct StdioStream {
    tx: Mutex<Option<mpsc::UnboundedSender<OutputLine>>>,
    handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StdioStream {
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
        let handle = tokio::task::spawn_blocking(move || {
            let stdout = std::io::stdout();
            let stderr = std::io::stderr();
            let mut out = std::io::LineWriter::new(stdout.lock());
            let mut err = std::io::LineWriter::new(stderr.lock());

            while let Some(line) = rx.blocking_recv() {
                match line {
                    OutputLine::Stdout(msg) => {
                        let _ = writeln!(out, "{}", msg);
                    }
                    OutputLine::Stderr(msg) => {
                        let _ = writeln!(err, "{}", msg);
                    }
                }
            }

            let _ = out.flush();
            let _ = err.flush();
        });
        Self {
            tx: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        }
    }

    fn send(&self, line: OutputLine) {
        if let Ok(guard) = self.tx.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(line);
            }
        }
    }

    /// Status lines that should not pollute machine-readable stdout.
    pub fn write_err_line(&self, line: &str) {
        self.send(OutputLine::Stderr(line.to_string()));
    }

    /// Drop the sender so the writer drains and exits, then wait for the
    /// final flush. Lines written after shutdown are discarded.
    pub async fn shutdown(&self) {
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
        let handle = self.handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl OutputStream for StdioStream {
    fn write_line(&self, line: &str) {
        self.send(OutputLine::Stdout(line.to_string()));
    }
}

/// In-memory stream for tests and embedders that want to capture output.
#[derive(Default)]
pub struct MemoryStream {
    lines: Mutex<Vec<String>>,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl OutputStream for MemoryStream {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Real environment backed by `std::env`.
pub struct RealEnv;

impl ProcessEnv for RealEnv {
    fn cwd(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// Fixed-cwd environment for tests and multi-root embedders.
pub struct FixedEnv {
    cwd: PathBuf,
}

impl FixedEnv {
    pub fn new(cwd: PathBuf) -> Self {
        Self { cwd }
    }
}

impl ProcessEnv for FixedEnv {
    fn cwd(&self) -> PathBuf {
        self.cwd.clone()
    }
}
