//! Run orchestration.
//!
//! `controller` owns the discovery → sequencing → execution pipeline;
//! `post_process` owns what happens to the aggregated result afterwards.
//! Collaborators (search engine, sequencer, backend, console) arrive as
//! trait objects so hosts and tests can swap them freely.

mod controller;
mod post_process;

pub use controller::{run_controller, Collaborators, NoTestsHook, RunArgs, RunHooks, RunParams};
pub use post_process::{
    process_results, CompletionCallback, PostProcessOptions, ResultsProcessor,
};
