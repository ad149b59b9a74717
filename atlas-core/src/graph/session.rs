use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use atlas_config::StoreSettings;

use crate::graph::memory::MemoryStore;
use crate::graph::op::GraphOp;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid store URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error(
        "unsupported store scheme {scheme:?}; wire transports are supplied by an external driver"
    )]
    UnsupportedScheme { scheme: String },

    #[error("session is closed")]
    SessionClosed,

    #[error("statement failed: {0}")]
    Statement(String),
}

/// One logical connection to the graph store.
///
/// Every call executes in its own transaction and reports the number of
/// affected records; the batched cleanup loop terminates on zero.
/// Sessions must be released via [`close`](GraphSession::close) on every
/// exit path of a run.
#[async_trait]
pub trait GraphSession: Send + Sync {
    async fn run(&self, op: &GraphOp) -> Result<u64, StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}

/// Handle to a store from which sessions are drawn.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn session(&self) -> Result<Box<dyn GraphSession>, StoreError>;
}

/// Opens a store for the configured URI.
///
/// `memory://` yields the in-process backend. Wire schemes (`bolt://`,
/// `neo4j://`, ...) require an external driver and are rejected with a
/// typed error here.
pub fn open_store(
    settings: &StoreSettings,
) -> Result<std::sync::Arc<dyn GraphStore>, StoreError> {
    let url = Url::parse(&settings.uri).map_err(|err| StoreError::InvalidUri {
        uri: settings.uri.clone(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "memory" => Ok(std::sync::Arc::new(MemoryStore::new())),
        scheme => Err(StoreError::UnsupportedScheme {
            scheme: scheme.to_string(),
        }),
    }
}
