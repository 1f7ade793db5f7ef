use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Flags shared by every context in a run.
///
/// Treated as a frozen value: the controller never mutates a `GlobalConfig`
/// in place, it replaces the whole object via `with_verbose` so readers can
/// never observe a half-updated config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub watch: bool,
    pub silent: bool,
    /// Tri-state verbosity: `None` is "not requested either way", which is
    /// what allows the single-test auto-enable in the controller.
    pub verbose: Option<bool>,
    #[serde(default, with = "humantime_serde")]
    pub test_timeout: Option<Duration>,
    pub run_id: String,
}

impl GlobalConfig {
    /// Full-replace copy with verbosity forced to `v`.
    pub fn with_verbose(&self, v: bool) -> Self {
        Self {
            verbose: Some(v),
            ..self.clone()
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            watch: false,
            silent: false,
            verbose: None,
            test_timeout: None,
            run_id: String::new(),
        }
    }
}

/// Per-project configuration. Same frozen-value discipline as `GlobalConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    pub root_dir: PathBuf,
    /// Directories searched for test files. Defaults to `[root_dir]`.
    pub roots: Vec<PathBuf>,
    /// File-name suffixes identifying test files (e.g. ".test.js", "_test.py").
    pub test_match: Vec<String>,
    /// Path substrings that exclude a file from discovery.
    pub ignore_patterns: Vec<String>,
    /// Argv prefix the process backend prepends to each test path.
    pub runner_argv: Vec<String>,
}

impl ContextConfig {
    /// Full-replace copy with `root_dir` rewritten.
    pub fn with_root_dir(&self, root_dir: PathBuf) -> Self {
        Self {
            root_dir,
            ..self.clone()
        }
    }
}

/// One project root's test universe: its frozen config plus metadata resolved
/// by the loader before the run starts.
#[derive(Debug)]
pub struct ProjectContext {
    pub config: Arc<ContextConfig>,
    /// Nearest enclosing git/hg repository root, if any. Resolved once at
    /// load time; `None` drives the no-SCM fallback in changed-only mode.
    pub scm_root: Option<PathBuf>,
}

impl ProjectContext {
    pub fn new(config: ContextConfig, scm_root: Option<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            scm_root,
        }
    }

    /// Copy of this context with its config replaced wholesale.
    pub fn with_config(&self, config: Arc<ContextConfig>) -> Self {
        Self {
            config,
            scm_root: self.scm_root.clone(),
        }
    }
}

/// How test files are selected for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionPattern {
    /// Raw user input, kept for display.
    pub input: String,
    /// The pattern actually matched against paths.
    pub test_path_pattern: String,
    /// When true, `input` is always displayed slash-delimited even if it
    /// equals `test_path_pattern`.
    pub treat_input_as_pattern: bool,
    /// Select only tests touched since the last commit.
    pub only_changed: bool,
    pub watch: bool,
    /// Skip SCM lookup entirely (set on the synthesized run-all fallback).
    pub skip_scm: bool,
}

impl SelectionPattern {
    /// The "run everything" pattern synthesized when changed-only discovery
    /// finds no repository in watch mode.
    pub fn run_all(&self) -> Self {
        Self {
            only_changed: false,
            skip_scm: true,
            ..self.clone()
        }
    }
}

/// Result of applying a selection pattern to one context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchSet {
    /// Absolute paths, in discovery order.
    pub tests: Vec<PathBuf>,
    /// Files matched per filter dimension, keyed by config field name.
    pub stats: BTreeMap<String, usize>,
    /// Total files checked in this context.
    pub total: usize,
    /// True when changed-only selection found no git/hg repository.
    pub no_scm: bool,
}

/// One schedulable unit of work: a test file within a context.
#[derive(Debug, Clone)]
pub struct TestDescriptor {
    pub context: Arc<ProjectContext>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub status: FileStatus,
    pub duration_ms: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Accumulated outcome of a whole run. Opaque to the controller beyond being
/// forwarded, serialized, and optionally rewritten by a results processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub num_total_files: usize,
    pub num_passed_files: usize,
    pub num_failed_files: usize,
    pub num_skipped_files: usize,
    #[serde(default)]
    pub start_time_utc: String,
    pub duration_ms: u64,
    pub success: bool,
    pub was_interrupted: bool,
    pub file_results: Vec<FileResult>,
}

impl AggregatedResult {
    /// The explicitly empty result used by the no-execution short-circuits.
    pub fn empty() -> Self {
        Self {
            num_total_files: 0,
            num_passed_files: 0,
            num_failed_files: 0,
            num_skipped_files: 0,
            start_time_utc: now_rfc3339(),
            duration_ms: 0,
            success: true,
            was_interrupted: false,
            file_results: Vec::new(),
        }
    }

    pub fn from_file_results(
        file_results: Vec<FileResult>,
        start_time_utc: String,
        duration_ms: u64,
        was_interrupted: bool,
    ) -> Self {
        let num_passed_files = file_results
            .iter()
            .filter(|r| r.status == FileStatus::Passed)
            .count();
        let num_failed_files = file_results
            .iter()
            .filter(|r| r.status == FileStatus::Failed)
            .count();
        let num_skipped_files = file_results
            .iter()
            .filter(|r| r.status == FileStatus::Skipped)
            .count();
        Self {
            num_total_files: file_results.len(),
            num_passed_files,
            num_failed_files,
            num_skipped_files,
            start_time_utc,
            duration_ms,
            success: num_failed_files == 0 && !was_interrupted,
            was_interrupted,
            file_results,
        }
    }

    /// Summary-shaped JSON view used for `--json` output and `--output-file`.
    pub fn formatted(&self) -> serde_json::Value {
        serde_json::json!({
            "summary": {
                "total": self.num_total_files,
                "passed": self.num_passed_files,
                "failed": self.num_failed_files,
                "skipped": self.num_skipped_files,
                "start_time_utc": self.start_time_utc,
                "duration_ms": self.duration_ms,
                "success": self.success,
                "was_interrupted": self.was_interrupted,
            },
            "test_results": self.file_results,
        })
    }
}

/// Current UTC time as RFC3339, with a plain fallback if formatting fails.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}
