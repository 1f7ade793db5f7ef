//! Test ordering policy and run-history persistence.
//!
//! The controller calls [`Sequencer::order`] once before execution and
//! [`Sequencer::persist`] once after, with the exact same descriptor list.

use crate::model::{AggregatedResult, FileStatus, TestDescriptor};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[async_trait]
pub trait Sequencer: Send + Sync {
    /// Reorder only: the returned list holds the same descriptors, no drops
    /// or duplicates.
    async fn order(&self, tests: Vec<TestDescriptor>) -> Result<Vec<TestDescriptor>>;

    /// Record timing and outcome history for future ordering decisions.
    async fn persist(&self, tests: &[TestDescriptor], result: &AggregatedResult) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct TimingEntry {
    duration_ms: u64,
    failed: bool,
}

/// Default policy: previously failed files first, then slowest first by
/// recorded duration; files never seen before sort by size so large files
/// start early. History lives in a JSON cache file.
pub struct TimingSequencer {
    cache_path: PathBuf,
    timings: Mutex<BTreeMap<PathBuf, TimingEntry>>,
}

impl TimingSequencer {
    pub fn new(cache_path: PathBuf) -> Self {
        let timings = std::fs::read(&cache_path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default();
        Self {
            cache_path,
            timings: Mutex::new(timings),
        }
    }

    /// Cache file under the user cache directory, next to nothing else.
    pub fn default_cache_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("testherd")
            .join("timings.json")
    }

    fn entry(&self, path: &Path) -> Option<TimingEntry> {
        self.timings.lock().ok().and_then(|t| t.get(path).copied())
    }

    /// Sort key: failed files first, then by expected cost descending.
    fn rank(&self, path: &Path) -> (bool, u64) {
        match self.entry(path) {
            Some(e) => (e.failed, e.duration_ms),
            None => {
                let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                (false, size)
            }
        }
    }
}

#[async_trait]
impl Sequencer for TimingSequencer {
    async fn order(&self, mut tests: Vec<TestDescriptor>) -> Result<Vec<TestDescriptor>> {
        tests.sort_by(|a, b| {
            let (a_failed, a_cost) = self.rank(&a.path);
            let (b_failed, b_cost) = self.rank(&b.path);
            b_failed
                .cmp(&a_failed)
                .then_with(|| b_cost.cmp(&a_cost))
        });
        Ok(tests)
    }

    async fn persist(&self, _tests: &[TestDescriptor], result: &AggregatedResult) -> Result<()> {
        {
            let mut timings = self
                .timings
                .lock()
                .map_err(|_| anyhow::anyhow!("timing cache lock poisoned"))?;
            for file in &result.file_results {
                if file.status == FileStatus::Skipped {
                    continue;
                }
                timings.insert(
                    file.path.clone(),
                    TimingEntry {
                        duration_ms: file.duration_ms,
                        failed: file.status == FileStatus::Failed,
                    },
                );
            }
        }
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let snapshot = self
            .timings
            .lock()
            .map_err(|_| anyhow::anyhow!("timing cache lock poisoned"))?
            .clone();
        let bytes = serde_json::to_vec(&snapshot)?;
        std::fs::write(&self.cache_path, bytes)
            .with_context(|| format!("failed to write {}", self.cache_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContextConfig, FileResult, ProjectContext};
    use std::sync::Arc;

    fn descriptor(context: &Arc<ProjectContext>, path: PathBuf) -> TestDescriptor {
        TestDescriptor {
            context: context.clone(),
            path,
        }
    }

    fn test_context(root: &Path) -> Arc<ProjectContext> {
        Arc::new(ProjectContext::new(
            ContextConfig {
                root_dir: root.to_path_buf(),
                roots: vec![root.to_path_buf()],
                test_match: vec![".test.js".into()],
                ignore_patterns: vec![],
                runner_argv: vec![],
            },
            None,
        ))
    }

    fn result_for(files: &[(&Path, FileStatus, u64)]) -> AggregatedResult {
        let file_results = files
            .iter()
            .map(|(path, status, duration_ms)| FileResult {
                path: path.to_path_buf(),
                status: *status,
                duration_ms: *duration_ms,
                message: None,
            })
            .collect();
        AggregatedResult::from_file_results(file_results, crate::model::now_rfc3339(), 0, false)
    }

    #[tokio::test]
    async fn persisted_timings_drive_slowest_first_order() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("timings.json");
        let ctx = test_context(dir.path());
        let fast = dir.path().join("fast.test.js");
        let slow = dir.path().join("slow.test.js");

        let sequencer = TimingSequencer::new(cache.clone());
        sequencer
            .persist(
                &[],
                &result_for(&[
                    (fast.as_path(), FileStatus::Passed, 5),
                    (slow.as_path(), FileStatus::Passed, 500),
                ]),
            )
            .await
            .unwrap();

        // Fresh instance reads the cache back from disk.
        let sequencer = TimingSequencer::new(cache);
        let ordered = sequencer
            .order(vec![
                descriptor(&ctx, fast.clone()),
                descriptor(&ctx, slow.clone()),
            ])
            .await
            .unwrap();
        assert_eq!(ordered[0].path, slow);
        assert_eq!(ordered[1].path, fast);
    }

    #[tokio::test]
    async fn failed_files_run_first() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("timings.json");
        let ctx = test_context(dir.path());
        let ok = dir.path().join("ok.test.js");
        let bad = dir.path().join("bad.test.js");

        let sequencer = TimingSequencer::new(cache);
        sequencer
            .persist(
                &[],
                &result_for(&[
                    (ok.as_path(), FileStatus::Passed, 900),
                    (bad.as_path(), FileStatus::Failed, 5),
                ]),
            )
            .await
            .unwrap();

        let ordered = sequencer
            .order(vec![
                descriptor(&ctx, ok.clone()),
                descriptor(&ctx, bad.clone()),
            ])
            .await
            .unwrap();
        assert_eq!(ordered[0].path, bad);
    }

    #[tokio::test]
    async fn order_never_drops_or_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());
        let sequencer = TimingSequencer::new(dir.path().join("timings.json"));
        let paths: Vec<PathBuf> = (0..5)
            .map(|i| dir.path().join(format!("t{i}.test.js")))
            .collect();
        let ordered = sequencer
            .order(paths.iter().map(|p| descriptor(&ctx, p.clone())).collect())
            .await
            .unwrap();
        assert_eq!(ordered.len(), paths.len());
        for path in &paths {
            assert_eq!(ordered.iter().filter(|d| &d.path == path).count(), 1);
        }
    }
}
