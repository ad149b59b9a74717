//! Shared configuration library for Atlas.
//!
//! Centralizes config models, env-driven loading, and guard-rail
//! validation so `atlasctl` and embedding services agree on defaults and
//! required fields. The full [`Config`] is assembled once at startup;
//! sync modules never read it directly — each receives a narrow view
//! built from it by its registry descriptor.

pub mod error;
pub mod loader;
pub mod models;
pub mod validation;

pub use error::ConfigLoadError;
pub use loader::{ConfigLoader, EnvSource, OsEnv};
pub use models::{Config, MetricsSettings, StoreSettings, SyncSettings};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings, validate};
