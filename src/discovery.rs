//! Per-context discovery fan-out.
//!
//! One search-engine call per context, all running concurrently; the caller
//! gets every context's match set back in context order once all have
//! settled. A failure in any context fails the whole fan-out.

use crate::model::{GlobalConfig, MatchSet, ProjectContext, SelectionPattern};
use crate::output::OutputStream;
use crate::search::SearchEngine;
use anyhow::Result;
use futures::future::try_join_all;
use std::sync::Arc;

/// Written once per context when changed-only selection cannot find a
/// repository outside watch mode.
pub const SCM_REQUIRED_MESSAGE: &str = "Changed-file selection requires a git or hg repository. \
Initialize one (`git init` or `hg init`) to run only tests related to uncommitted changes, \
or run again without the changed-only flag.";

/// One context's discovery outcome.
pub struct ContextMatch {
    pub context: Arc<ProjectContext>,
    pub matches: MatchSet,
}

async fn discover_context(
    search: &dyn SearchEngine,
    context: Arc<ProjectContext>,
    pattern: &SelectionPattern,
    global: &GlobalConfig,
    out: &dyn OutputStream,
) -> Result<ContextMatch> {
    let mut matches = search.discover(&context, pattern).await?;

    if matches.tests.is_empty() && pattern.only_changed && matches.no_scm {
        if global.watch {
            // Watch mode would otherwise sit on an empty screen; fall back to
            // running everything, skipping the SCM lookup that just failed.
            matches = search.discover(&context, &pattern.run_all()).await?;
        } else {
            out.write_line(SCM_REQUIRED_MESSAGE);
        }
    }

    Ok(ContextMatch { context, matches })
}

/// Fan out discovery across all contexts and wait for every one to settle.
pub async fn discover_all(
    search: &dyn SearchEngine,
    contexts: &[Arc<ProjectContext>],
    pattern: &SelectionPattern,
    global: &GlobalConfig,
    out: &dyn OutputStream,
) -> Result<Vec<ContextMatch>> {
    try_join_all(
        contexts
            .iter()
            .map(|context| discover_context(search, context.clone(), pattern, global, out)),
    )
    .await
}
