//! Post-run processing: external processor hook, JSON serialization, and the
//! completion callback.

use crate::model::AggregatedResult;
use crate::output::{OutputStream, ProcessEnv};
use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Host-resolved results processor; its return value replaces the
/// aggregated result unvalidated.
pub type ResultsProcessor = Arc<dyn Fn(AggregatedResult) -> AggregatedResult + Send + Sync>;

/// Invoked exactly once at the end of every completed run. Whatever it
/// returns becomes the controller's result.
pub type CompletionCallback = Box<dyn FnOnce(AggregatedResult) -> AggregatedResult + Send>;

pub struct PostProcessOptions {
    pub processor: Option<ResultsProcessor>,
    pub json: bool,
    pub output_file: Option<PathBuf>,
    pub on_complete: Option<CompletionCallback>,
}

/// Process a completed run: apply the processor, serialize when asked, and
/// hand the result to the completion callback.
pub fn process_results(
    result: AggregatedResult,
    options: PostProcessOptions,
    out: &dyn OutputStream,
    env: &dyn ProcessEnv,
) -> Result<AggregatedResult> {
    let result = match options.processor {
        Some(processor) => processor(result),
        None => result,
    };

    if options.json {
        let text = serde_json::to_string(&result.formatted())?;
        match options.output_file {
            Some(path) => {
                let cwd = env.cwd();
                let resolved = if path.is_absolute() {
                    path
                } else {
                    cwd.join(path)
                };
                std::fs::write(&resolved, &text)
                    .with_context(|| format!("failed to write {}", resolved.display()))?;
                let shown = resolved
                    .strip_prefix(&cwd)
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|_| resolved.clone());
                out.write_line(&format!("Test results written to: {}", shown.display()));
            }
            None => out.write_line(&text),
        }
    }

    match options.on_complete {
        Some(callback) => Ok(callback(result)),
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{FixedEnv, MemoryStream};

    fn options() -> PostProcessOptions {
        PostProcessOptions {
            processor: None,
            json: false,
            output_file: None,
            on_complete: None,
        }
    }

    #[test]
    fn json_mode_writes_exact_text_to_stream() {
        let out = MemoryStream::new();
        let env = FixedEnv::new("/work".into());
        let result = AggregatedResult::empty();
        let expected = serde_json::to_string(&result.formatted()).unwrap();

        process_results(
            result,
            PostProcessOptions {
                json: true,
                ..options()
            },
            &out,
            &env,
        )
        .unwrap();
        assert_eq!(out.lines(), vec![expected]);
    }

    #[test]
    fn output_file_is_resolved_against_cwd_and_reported_relative() {
        let dir = tempfile::tempdir().unwrap();
        let out = MemoryStream::new();
        let env = FixedEnv::new(dir.path().to_path_buf());
        let result = AggregatedResult::empty();
        let expected = serde_json::to_string(&result.formatted()).unwrap();

        process_results(
            result,
            PostProcessOptions {
                json: true,
                output_file: Some("results.json".into()),
                ..options()
            },
            &out,
            &env,
        )
        .unwrap();
        let written = std::fs::read_to_string(dir.path().join("results.json")).unwrap();
        assert_eq!(written, expected);
        assert_eq!(out.lines(), vec!["Test results written to: results.json".to_string()]);
    }

    #[test]
    fn processor_output_replaces_result_before_serialization() {
        let out = MemoryStream::new();
        let env = FixedEnv::new("/work".into());
        let processed = process_results(
            AggregatedResult::empty(),
            PostProcessOptions {
                processor: Some(Arc::new(|mut r| {
                    r.num_total_files = 42;
                    r
                })),
                json: true,
                ..options()
            },
            &out,
            &env,
        )
        .unwrap();
        assert_eq!(processed.num_total_files, 42);
        assert!(out.lines()[0].contains("\"total\":42"));
    }

    #[test]
    fn callback_return_value_wins() {
        let out = MemoryStream::new();
        let env = FixedEnv::new("/work".into());
        let returned = process_results(
            AggregatedResult::empty(),
            PostProcessOptions {
                on_complete: Some(Box::new(|mut r| {
                    r.duration_ms = 7;
                    r
                })),
                ..options()
            },
            &out,
            &env,
        )
        .unwrap();
        assert_eq!(returned.duration_ms, 7);
    }
}
