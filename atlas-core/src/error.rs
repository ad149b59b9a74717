use thiserror::Error;

use crate::graph::cleanup::CleanupSpecError;
use crate::graph::session::StoreError;

/// Error taxonomy for one sync run.
///
/// `Configuration` and `Selection` are pre-run fatal: no module executes.
/// `Provider` is subject to the run's failure policy. `GraphWrite` always
/// aborts the module that raised it, since a module's writes are not
/// idempotent across a mid-write crash. `Interrupted` aborts the run
/// under every policy.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("configuration error for module {module}: {message}")]
    Configuration { module: String, message: String },

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("graph write failed: {0}")]
    GraphWrite(#[from] StoreError),

    #[error("invalid cleanup spec: {0}")]
    CleanupSpec(#[from] CleanupSpecError),

    #[error("unknown module(s) requested: {}", names.join(", "))]
    Selection { names: Vec<String> },

    #[error("sync interrupted")]
    Interrupted,

    #[error("{} module(s) failed: {}", failed.len(), failed.join(", "))]
    Aggregate { failed: Vec<String> },
}

impl SyncError {
    pub fn provider(message: impl Into<String>) -> Self {
        SyncError::Provider {
            message: message.into(),
        }
    }

    pub fn configuration(
        module: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SyncError::Configuration {
            module: module.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
