//! testherd: multi-project test orchestration.
//!
//! The core is [`orchestrator::run_controller`]: it discovers test files
//! across project contexts concurrently, orders them through a
//! [`sequencer::Sequencer`], dispatches them to an
//! [`backend::ExecutionBackend`] with a cancellation token, and
//! post-processes the aggregated result (processor hook, JSON output,
//! completion callback). Reference implementations of every collaborator
//! ship alongside the traits so the CLI works out of the box.

pub mod backend;
pub mod cancel;
pub mod cli;
pub mod discovery;
pub mod format;
pub mod model;
pub mod no_tests;
pub mod orchestrator;
pub mod output;
pub mod search;
pub mod sequencer;
pub mod summary;
