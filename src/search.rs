//! Test-file discovery for one context.
//!
//! The controller only depends on the [`SearchEngine`] trait; the bundled
//! [`FsSearchEngine`] is the filesystem implementation the CLI wires in.

use crate::model::{MatchSet, ProjectContext, SelectionPattern};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Turns a selection pattern into a per-context match set.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn discover(
        &self,
        context: &ProjectContext,
        pattern: &SelectionPattern,
    ) -> Result<MatchSet>;
}

/// Filesystem discovery: walk the configured roots, keep files whose name
/// matches a `test_match` suffix, drop ignored paths, then apply the path
/// pattern and (optionally) the changed-files filter.
pub struct FsSearchEngine;

impl FsSearchEngine {
    pub fn new() -> Self {
        Self
    }

    async fn changed_files(&self, scm_root: &Path) -> Result<BTreeSet<PathBuf>> {
        let output = tokio::process::Command::new("git")
            .args(["status", "--porcelain"])
            .current_dir(scm_root)
            .output()
            .await
            .context("failed to invoke git for changed-file detection")?;
        let mut changed = BTreeSet::new();
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            // Porcelain format: two status columns, a space, then the path.
            if line.len() > 3 {
                changed.insert(scm_root.join(line[3..].trim()));
            }
        }
        Ok(changed)
    }
}

impl Default for FsSearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_suffix(name: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|s| name.ends_with(s.as_str()))
}

fn is_ignored(path: &str, ignore_patterns: &[String]) -> bool {
    ignore_patterns.iter().any(|p| path.contains(p.as_str()))
}

#[async_trait]
impl SearchEngine for FsSearchEngine {
    async fn discover(
        &self,
        context: &ProjectContext,
        pattern: &SelectionPattern,
    ) -> Result<MatchSet> {
        let config = &context.config;

        let changed = if pattern.only_changed && !pattern.skip_scm {
            match context.scm_root.as_deref() {
                // Nothing was checked: the caller decides between the
                // watch-mode fallback and the explanatory message.
                None => {
                    return Ok(MatchSet {
                        no_scm: true,
                        ..MatchSet::default()
                    })
                }
                Some(root) => Some(self.changed_files(root).await?),
            }
        } else {
            None
        };

        let mut tests = Vec::new();
        let mut total = 0usize;
        let mut not_ignored = 0usize;
        let mut suffix_matched = 0usize;

        for root in &config.roots {
            for entry in WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                total += 1;
                let path = entry.path();
                let path_str = path.to_string_lossy();
                if is_ignored(&path_str, &config.ignore_patterns) {
                    continue;
                }
                not_ignored += 1;
                let name = entry.file_name().to_string_lossy();
                if !matches_suffix(&name, &config.test_match) {
                    continue;
                }
                suffix_matched += 1;
                if !pattern.test_path_pattern.is_empty()
                    && !path_str.contains(pattern.test_path_pattern.as_str())
                {
                    continue;
                }
                if let Some(changed) = changed.as_ref() {
                    if !changed.contains(path) {
                        continue;
                    }
                }
                tests.push(path.to_path_buf());
            }
        }

        let mut stats = BTreeMap::new();
        stats.insert("roots".to_string(), total);
        stats.insert("ignore_patterns".to_string(), not_ignored);
        stats.insert("test_match".to_string(), suffix_matched);

        Ok(MatchSet {
            tests,
            stats,
            total,
            no_scm: false,
        })
    }
}
