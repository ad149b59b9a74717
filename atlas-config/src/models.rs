use std::time::Duration;

/// Fully assembled Atlas configuration.
///
/// Assembled once at startup from environment and CLI input. Core code
/// reads only the declared fields; per-module views are carved out of
/// this struct by the module registry before the run starts.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreSettings,
    pub sync: SyncSettings,
    pub metrics: MetricsSettings,
}

/// Connection settings for the property-graph store.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Store URI, e.g. `bolt://graph:7687` or `memory://` for the
    /// in-process backend.
    pub uri: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Upper bound on how long the driver keeps one TCP connection alive.
    pub max_connection_lifetime: Option<Duration>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: "memory://".to_string(),
            user: None,
            password: None,
            max_connection_lifetime: None,
        }
    }
}

/// Run-level sync settings consumed by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
    /// Overrides the wall-clock update tag. Intended for deterministic
    /// testing; real runs rely on the default time-derived tag.
    pub update_tag: Option<i64>,
    /// Log-and-continue past per-module failures instead of aborting.
    pub best_effort: bool,
    /// Requested subset of registry modules. `None` selects everything.
    pub requested_modules: Option<Vec<String>>,
    /// Batch bound for cleanup deletions.
    pub cleanup_batch_size: Option<u64>,
}

/// Metrics collaborator settings. The transport itself is external;
/// Atlas only forwards `(module, duration, outcome)` events.
#[derive(Debug, Clone, Default)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub prefix: Option<String>,
}
