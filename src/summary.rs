//! Human-readable summary lines for a finished run (CLI text mode).

use crate::format::pluralize;
use crate::model::{AggregatedResult, FileStatus};

/// Pre-formatted lines for text output.
pub struct RunSummary {
    pub lines: Vec<String>,
}

/// Build summary lines; `verbose` adds one line per test file.
pub fn build_run_summary(result: &AggregatedResult, verbose: bool) -> RunSummary {
    let mut lines = Vec::new();

    if verbose {
        for file in &result.file_results {
            let marker = match file.status {
                FileStatus::Passed => "PASS",
                FileStatus::Failed => "FAIL",
                FileStatus::Skipped => "SKIP",
            };
            let mut line = format!("{marker} {} ({} ms)", file.path.display(), file.duration_ms);
            if let Some(message) = file.message.as_deref() {
                line.push_str(&format!(" - {message}"));
            }
            lines.push(line);
        }
    }

    lines.push(format!(
        "Tests: {} passed, {} failed, {} skipped, {} total",
        result.num_passed_files,
        result.num_failed_files,
        result.num_skipped_files,
        result.num_total_files
    ));
    lines.push(format!(
        "Time:  {:.2}s ({})",
        result.duration_ms as f64 / 1000.0,
        pluralize("file", result.num_total_files, "s")
    ));
    if result.was_interrupted {
        lines.push("Run was interrupted.".to_string());
    }

    RunSummary { lines }
}
