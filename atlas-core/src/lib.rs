//! # Atlas Core
//!
//! Sync orchestrator and generational cleanup engine for the Atlas asset
//! graph. One run computes an update tag, drives the registered provider
//! modules in declaration order against a shared store session, and then
//! sweeps each module's anchored sub-graph of entities the run no longer
//! observed.
//!
//! ## Architecture
//!
//! - [`graph`]: store session seam, typed graph operations, the in-memory
//!   backend, parameterized statement rendering, graph jobs, and the
//!   cleanup job builder.
//! - [`sync`]: module registry, module runner with failure policies, and
//!   the orchestrator itself.
//! - [`modules`]: built-in modules (currently index creation).
//! - [`metrics`]: seam for the external metrics collaborator.
//!
//! Provider API clients are external: a provider module only receives a
//! store session, the run's update tag, and its own configuration view.

pub mod error;
pub mod graph;
pub mod metrics;
pub mod modules;
pub mod sync;

pub use error::{Result, SyncError};
pub use graph::cleanup::{CleanupJobBuilder, CleanupPath, CleanupSpec};
pub use graph::job::{GraphJob, JobStatement};
pub use graph::memory::{MemorySession, MemoryStore};
pub use graph::op::{GraphOp, Hop, MergeNode, MergeRelationship, StaleScope};
pub use graph::session::{GraphSession, GraphStore, StoreError, open_store};
pub use graph::statement::{Statement, render};
pub use metrics::{LogSink, MetricsSink, NoopSink, sink_from_settings};
pub use modules::registry_with;
pub use sync::module::{ModuleRegistry, ModuleSpec, SyncModule};
pub use sync::orchestrator::{RunSummary, SyncOrchestrator};
pub use sync::runner::{FailurePolicy, ModuleOutcome, RunResult};
pub use sync::tag::TagSource;
