//! Child-process execution backend.
//!
//! Each test file is run as `runner_argv... <path>` from its context's
//! `root_dir`. Exit code zero is a pass, anything else a fail; tests not yet
//! started when cancellation fires are recorded as skipped.

use super::{ExecutionBackend, RunOptions};
use crate::cancel::CancelToken;
use crate::model::{AggregatedResult, FileResult, FileStatus, TestDescriptor};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;

pub struct ProcessBackend;

impl ProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessBackend {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_one(
    test: TestDescriptor,
    cancel: CancelToken,
    options: &RunOptions,
) -> Result<FileResult> {
    if cancel.is_cancelled() {
        return Ok(FileResult {
            path: test.path,
            status: FileStatus::Skipped,
            duration_ms: 0,
            message: Some("run cancelled".into()),
        });
    }

    let argv = &test.context.config.runner_argv;
    let program = argv
        .first()
        .ok_or_else(|| anyhow!("empty runner_argv for {}", test.path.display()))?;
    let mut command = tokio::process::Command::new(program);
    command
        .args(&argv[1..])
        .arg(&test.path)
        .current_dir(&test.context.config.root_dir)
        .env("TESTHERD_RUN_ID", &options.global.run_id)
        .kill_on_drop(true);
    if let Some(filter) = options.test_name_filter.as_deref() {
        command.env("TESTHERD_NAME_FILTER", filter);
    }

    let started = tokio::time::Instant::now();
    let wait = async {
        let mut child = command.spawn()?;
        anyhow::Ok(child.wait().await?)
    };

    let status = tokio::select! {
        status = async {
            match options.global.test_timeout {
                Some(limit) => match tokio::time::timeout(limit, wait).await {
                    Ok(status) => status.map(Some),
                    Err(_) => Ok(None),
                },
                None => wait.await.map(Some),
            }
        } => status?,
        () = cancel.cancelled() => {
            return Ok(FileResult {
                path: test.path,
                status: FileStatus::Skipped,
                duration_ms: started.elapsed().as_millis() as u64,
                message: Some("run cancelled".into()),
            });
        }
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    let result = match status {
        Some(status) if status.success() => FileResult {
            path: test.path,
            status: FileStatus::Passed,
            duration_ms,
            message: None,
        },
        Some(status) => FileResult {
            path: test.path,
            status: FileStatus::Failed,
            duration_ms,
            message: Some(format!("runner exited with {status}")),
        },
        None => FileResult {
            path: test.path,
            status: FileStatus::Failed,
            duration_ms,
            message: Some("test timed out".into()),
        },
    };
    Ok(result)
}

#[async_trait]
impl ExecutionBackend for ProcessBackend {
    async fn run(
        &self,
        tests: &[TestDescriptor],
        cancel: CancelToken,
        options: RunOptions,
    ) -> Result<AggregatedResult> {
        if let Some(hook) = options.on_start.as_ref() {
            hook();
        }

        let start_time_utc = crate::model::now_rfc3339();
        let started = tokio::time::Instant::now();
        let workers = options.worker_ceiling.max(1);

        // `buffered` dispatches in sequencer order and yields results in the
        // same order, so the aggregate reads like the planned run.
        let file_results: Vec<FileResult> = futures::stream::iter(
            tests
                .iter()
                .cloned()
                .map(|test| run_one(test, cancel.clone(), &options)),
        )
        .buffered(workers)
        .collect::<Vec<Result<FileResult>>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

        Ok(AggregatedResult::from_file_results(
            file_results,
            start_time_utc,
            started.elapsed().as_millis() as u64,
            cancel.is_cancelled(),
        ))
    }
}
