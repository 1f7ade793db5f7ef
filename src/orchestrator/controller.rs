//! The run controller: a straight-line pipeline from selection to
//! post-processing.
//!
//! Discovery fans out per context; everything after it is sequential. No
//! retries and no loop-backs: any collaborator failure propagates to the
//! caller and the completion callback is never invoked on that path.

use crate::backend::{ExecutionBackend, RunOptions, StartHook};
use crate::cancel::CancelToken;
use crate::discovery::{discover_all, ContextMatch};
use crate::format::format_pattern;
use crate::model::{
    AggregatedResult, GlobalConfig, ProjectContext, SelectionPattern, TestDescriptor,
};
use crate::no_tests::no_tests_message;
use crate::orchestrator::post_process::{
    process_results, CompletionCallback, PostProcessOptions, ResultsProcessor,
};
use crate::output::{OutputStream, ProcessEnv};
use crate::search::SearchEngine;
use crate::sequencer::Sequencer;
use anyhow::{anyhow, Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI-derived inputs the controller treats as opaque.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub pattern: Option<String>,
    pub treat_input_as_pattern: bool,
    pub only_changed: bool,
    /// Print the ordered test list and stop; no execution.
    pub list_tests: bool,
    pub json: bool,
    pub output_file: Option<PathBuf>,
    pub test_name_filter: Option<String>,
    pub max_workers: Option<usize>,
}

/// Overrides the built-in no-tests diagnostics when supplied by the host.
pub type NoTestsHook = Box<dyn FnOnce(&[ContextMatch], &SelectionPattern) + Send>;

/// Optional host integration points.
#[derive(Default)]
pub struct RunHooks {
    pub on_start: Option<StartHook>,
    pub on_complete: Option<CompletionCallback>,
    pub print_no_tests: Option<NoTestsHook>,
}

/// The external collaborators the controller drives.
pub struct Collaborators {
    pub search: Arc<dyn SearchEngine>,
    pub sequencer: Arc<dyn Sequencer>,
    pub backend: Arc<dyn ExecutionBackend>,
}

pub struct RunParams {
    pub global: GlobalConfig,
    pub contexts: Vec<Arc<ProjectContext>>,
    pub args: RunArgs,
    pub processor: Option<ResultsProcessor>,
    pub hooks: RunHooks,
}

fn compute_selection(args: &RunArgs, global: &GlobalConfig) -> SelectionPattern {
    let input = args.pattern.clone().unwrap_or_default();
    SelectionPattern {
        test_path_pattern: input.clone(),
        input,
        treat_input_as_pattern: args.treat_input_as_pattern,
        only_changed: args.only_changed,
        watch: global.watch,
        skip_scm: false,
    }
}

fn default_worker_ceiling() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Run the whole pipeline once.
///
/// Returns `None` for the list-tests short-circuit, otherwise whatever the
/// completion callback returned (or the processed result when no callback
/// was supplied).
pub async fn run_controller(
    params: RunParams,
    collab: &Collaborators,
    out: &dyn OutputStream,
    env: &dyn ProcessEnv,
    cancel: CancelToken,
) -> Result<Option<AggregatedResult>> {
    let RunParams {
        global,
        contexts,
        args,
        processor,
        mut hooks,
    } = params;

    let pattern = compute_selection(&args, &global);
    let worker_ceiling = args.max_workers.unwrap_or_else(default_worker_ceiling);

    let run_data = discover_all(collab.search.as_ref(), &contexts, &pattern, &global, out)
        .await
        .context("test discovery failed")?;

    // Concatenate in context order, keeping each context's discovery order;
    // the sequencer alone decides the physical run order from here.
    let mut tests = Vec::new();
    for data in &run_data {
        tests.extend(data.matches.tests.iter().map(|path| TestDescriptor {
            context: data.context.clone(),
            path: path.clone(),
        }));
    }
    let tests = collab
        .sequencer
        .order(tests)
        .await
        .context("sequencer failed to order tests")?;

    if args.list_tests {
        let paths: Vec<String> = tests.iter().map(|t| t.path.display().to_string()).collect();
        out.write_line(&serde_json::to_string(&paths)?);
        if let Some(callback) = hooks.on_complete.take() {
            callback(AggregatedResult::empty());
        }
        return Ok(None);
    }

    let mut global = global;
    if tests.is_empty() {
        match hooks.print_no_tests.take() {
            Some(hook) => hook(&run_data, &pattern),
            None => out.write_line(&no_tests_message(&run_data, &pattern, &global)),
        }
        // The run still completes: execution of the empty list produces an
        // empty aggregate and the completion callback fires normally.
    } else if tests.len() == 1 && !global.silent && global.verbose != Some(false) {
        // A single-test run benefits from maximal detail at negligible cost.
        global = global.with_verbose(true);
    }

    // Past this point rootDir only matters for display; anchor every context
    // to one common directory so printed paths line up across projects.
    let cwd = env.cwd();
    let normalized: Vec<Arc<ProjectContext>> = contexts
        .iter()
        .map(|c| Arc::new(c.with_config(Arc::new(c.config.with_root_dir(cwd.clone())))))
        .collect();
    let mut ordered = Vec::with_capacity(tests.len());
    for test in tests {
        let idx = contexts
            .iter()
            .position(|c| Arc::ptr_eq(c, &test.context))
            .ok_or_else(|| {
                anyhow!(
                    "test {} does not belong to any known context",
                    test.path.display()
                )
            })?;
        ordered.push(TestDescriptor {
            context: normalized[idx].clone(),
            path: test.path,
        });
    }

    let options = RunOptions {
        global: global.clone(),
        worker_ceiling,
        formatted_pattern: format_pattern(&pattern),
        pattern,
        test_name_filter: args.test_name_filter.clone(),
        on_start: hooks.on_start.clone(),
    };
    let result = collab
        .backend
        .run(&ordered, cancel, options)
        .await
        .context("test execution failed")?;

    collab
        .sequencer
        .persist(&ordered, &result)
        .await
        .context("failed to persist run history")?;

    let final_result = process_results(
        result,
        PostProcessOptions {
            processor,
            json: args.json,
            output_file: args.output_file.clone(),
            on_complete: hooks.on_complete.take(),
        },
        out,
        env,
    )?;
    Ok(Some(final_result))
}
