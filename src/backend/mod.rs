//! Execution backend seam.
//!
//! The controller hands the ordered descriptor list, a cancellation token,
//! and [`RunOptions`] to an [`ExecutionBackend`] and suspends until it
//! produces an [`AggregatedResult`]. Worker parallelism, timeouts, and
//! reporting details all live behind this trait.

mod process;

pub use process::ProcessBackend;

use crate::cancel::CancelToken;
use crate::model::{AggregatedResult, GlobalConfig, SelectionPattern, TestDescriptor};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Invoked by the backend once, right before the first test starts.
pub type StartHook = Arc<dyn Fn() + Send + Sync>;

/// Everything a backend needs besides the test list itself.
#[derive(Clone)]
pub struct RunOptions {
    pub global: GlobalConfig,
    /// Upper bound on concurrent workers; the backend may use fewer.
    pub worker_ceiling: usize,
    pub pattern: SelectionPattern,
    /// Human-readable rendering of `pattern`, for reporting.
    pub formatted_pattern: String,
    /// Restricts which test names run within each file; interpretation is
    /// the runner's business.
    pub test_name_filter: Option<String>,
    pub on_start: Option<StartHook>,
}

#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn run(
        &self,
        tests: &[TestDescriptor],
        cancel: CancelToken,
        options: RunOptions,
    ) -> Result<AggregatedResult>;
}
