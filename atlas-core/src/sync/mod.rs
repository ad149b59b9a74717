//! Module registry, runner, and the sync orchestrator.

pub mod module;
pub mod orchestrator;
pub mod runner;
pub mod tag;
