//! Run creation and k-way merge orchestration for the out-of-core sorter.
//!
//! * [`EngineConfig`] — the tunables for one sort invocation.
//! * [`RunCreator`] / [`SharedInput`] — the per-worker run-creation loop.
//! * [`RunMerger`] — k-way merge across run readers.
//! * [`Orchestrator`] — wires the above together end to end.

mod config;
mod orchestrator;
mod run_creator;
mod run_merger;

pub use config::EngineConfig;
pub use orchestrator::Orchestrator;
pub use run_creator::{RunCreator, RunWriterFactory, SharedInput};
pub use run_merger::RunMerger;
