use crate::backend::ProcessBackend;
use crate::cancel::cancel_pair;
use crate::model::{ContextConfig, GlobalConfig, ProjectContext};
use crate::orchestrator::{run_controller, Collaborators, RunArgs, RunHooks, RunParams};
use crate::output::{RealEnv, StdioStream};
use crate::search::FsSearchEngine;
use crate::sequencer::TimingSequencer;
use crate::summary::build_run_summary;
use anyhow::{Context as _, Result};
use clap::Parser;
use rand::RngCore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "testherd",
    version,
    about = "Discover, order, and run test files across one or more project roots"
)]
pub struct Cli {
    /// Run only tests whose path contains this pattern
    pub pattern: Option<String>,

    /// Project root directory; repeat for multiple contexts
    #[arg(long = "root", default_value = ".")]
    pub roots: Vec<PathBuf>,

    /// File-name suffix identifying test files; repeatable
    #[arg(long = "test-match", default_value = ".test.js")]
    pub test_match: Vec<String>,

    /// Path substring excluded from discovery; repeatable
    #[arg(long = "ignore")]
    pub ignore_patterns: Vec<String>,

    /// Runner command prepended to each test path (split on whitespace)
    #[arg(long, default_value = "node")]
    pub runner: String,

    /// Always display the pattern slash-delimited, as a pattern
    #[arg(long)]
    pub regex: bool,

    /// Run only tests related to files changed since the last commit
    #[arg(long)]
    pub only_changed: bool,

    /// Watch-mode semantics: changed-only discovery without a repository
    /// falls back to running everything
    #[arg(long)]
    pub watch: bool,

    /// Print the ordered list of matched test files and exit
    #[arg(long)]
    pub list_tests: bool,

    /// Print the JSON-formatted result
    #[arg(long)]
    pub json: bool,

    /// Write the JSON result to this file instead of stdout
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Only run tests whose name matches (forwarded to the runner)
    #[arg(long, short = 't')]
    pub test_name_filter: Option<String>,

    /// Worker-count ceiling for the execution backend
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Suppress the run summary
    #[arg(long)]
    pub silent: bool,

    /// Per-file result lines in the summary
    #[arg(long)]
    pub verbose: bool,

    /// Per-test timeout (e.g. 30s, 2m)
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,
}

/// Random identifier attached to each run.
fn gen_run_id() -> String {
    let mut b = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut b);
    u64::from_le_bytes(b).to_string()
}

pub fn build_global_config(args: &Cli) -> GlobalConfig {
    GlobalConfig {
        watch: args.watch,
        silent: args.silent,
        verbose: if args.verbose { Some(true) } else { None },
        test_timeout: args.timeout.map(Into::into),
        run_id: gen_run_id(),
    }
}

pub fn build_run_args(args: &Cli) -> RunArgs {
    RunArgs {
        pattern: args.pattern.clone(),
        treat_input_as_pattern: args.regex,
        only_changed: args.only_changed,
        list_tests: args.list_tests,
        json: args.json,
        output_file: args.output_file.clone(),
        test_name_filter: args.test_name_filter.clone(),
        max_workers: args.max_workers,
    }
}

/// Nearest enclosing directory containing `.git` or `.hg`, if any.
fn find_scm_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        if current.join(".git").exists() || current.join(".hg").exists() {
            return Some(current.to_path_buf());
        }
        dir = current.parent();
    }
    None
}

/// One context per `--root`, with SCM metadata resolved up front.
pub fn build_contexts(args: &Cli) -> Result<Vec<Arc<ProjectContext>>> {
    let runner_argv: Vec<String> = args.runner.split_whitespace().map(String::from).collect();
    anyhow::ensure!(!runner_argv.is_empty(), "--runner must not be empty");

    args.roots
        .iter()
        .map(|root| {
            let root_dir = root
                .canonicalize()
                .with_context(|| format!("cannot resolve root {}", root.display()))?;
            let scm_root = find_scm_root(&root_dir);
            Ok(Arc::new(ProjectContext::new(
                ContextConfig {
                    roots: vec![root_dir.clone()],
                    root_dir,
                    test_match: args.test_match.clone(),
                    ignore_patterns: args.ignore_patterns.clone(),
                    runner_argv: runner_argv.clone(),
                },
                scm_root,
            )))
        })
        .collect()
}

/// Wire the reference collaborators and drive one run. Returns whether the
/// run succeeded so `main` can pick the exit code.
pub async fn run(args: Cli) -> Result<bool> {
    let global = build_global_config(&args);
    let contexts = build_contexts(&args)?;
    let run_args = build_run_args(&args);

    let collab = Collaborators {
        search: Arc::new(FsSearchEngine::new()),
        sequencer: Arc::new(TimingSequencer::new(TimingSequencer::default_cache_path())),
        backend: Arc::new(ProcessBackend::new()),
    };
    let out = StdioStream::spawn();
    let env = RealEnv;

    let (cancel_handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_handle.cancel();
        }
    });

    let silent = global.silent;
    let verbose = global.verbose == Some(true);
    let json = run_args.json;

    let outcome = run_controller(
        RunParams {
            global,
            contexts,
            args: run_args,
            processor: None,
            hooks: RunHooks::default(),
        },
        &collab,
        &out,
        &env,
        cancel,
    )
    .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            out.shutdown().await;
            return Err(e);
        }
    };

    let success = match outcome {
        // List-tests short-circuit: nothing ran, nothing to judge.
        None => true,
        Some(result) => {
            if !json && !silent {
                // Single-test runs get the same verbosity bump the
                // controller applied to the execution side.
                let detail = verbose || result.num_total_files == 1;
                for line in build_run_summary(&result, detail).lines {
                    out.write_err_line(&line);
                }
            }
            result.success
        }
    };

    out.shutdown().await;
    Ok(success)
}
