use thiserror::Error;

use crate::models::Config;

/// Hard configuration faults that must stop a run before it starts.
#[derive(Error, Debug)]
pub enum ConfigGuardRailError {
    #[error("store URI must not be empty")]
    EmptyStoreUri,

    #[error("cleanup batch size must be greater than zero")]
    ZeroCleanupBatch,

    #[error("requested module list is present but empty")]
    EmptyModuleSelection,

    #[error("update tag override must be positive, got {0}")]
    NonPositiveUpdateTag(i64),
}

/// Non-fatal findings surfaced to the operator at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Credentials supplied for the in-process store, which ignores them.
    CredentialsIgnoredByMemoryStore,
    /// Metrics enabled without a host to deliver to.
    MetricsEnabledWithoutHost,
}

#[derive(Debug, Default)]
pub struct ConfigWarnings(pub Vec<ConfigWarning>);

impl ConfigWarnings {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn log(&self) {
        for warning in &self.0 {
            match warning {
                ConfigWarning::CredentialsIgnoredByMemoryStore => {
                    tracing::warn!(
                        "store credentials are set but the memory:// backend ignores them"
                    );
                }
                ConfigWarning::MetricsEnabledWithoutHost => {
                    tracing::warn!(
                        "metrics are enabled but no statsd host is configured; events will be logged only"
                    );
                }
            }
        }
    }
}

/// Guard-rail pass over an assembled configuration.
pub fn validate(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    if config.store.uri.trim().is_empty() {
        return Err(ConfigGuardRailError::EmptyStoreUri);
    }
    if let Some(0) = config.sync.cleanup_batch_size {
        return Err(ConfigGuardRailError::ZeroCleanupBatch);
    }
    if let Some(requested) = &config.sync.requested_modules
        && requested.is_empty()
    {
        return Err(ConfigGuardRailError::EmptyModuleSelection);
    }
    if let Some(tag) = config.sync.update_tag
        && tag <= 0
    {
        return Err(ConfigGuardRailError::NonPositiveUpdateTag(tag));
    }

    let mut warnings = ConfigWarnings::default();
    if config.store.uri.starts_with("memory://")
        && (config.store.user.is_some() || config.store.password.is_some())
    {
        warnings
            .0
            .push(ConfigWarning::CredentialsIgnoredByMemoryStore);
    }
    if config.metrics.enabled && config.metrics.host.is_none() {
        warnings.0.push(ConfigWarning::MetricsEnabledWithoutHost);
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricsSettings, StoreSettings, SyncSettings};

    fn base_config() -> Config {
        Config {
            store: StoreSettings::default(),
            sync: SyncSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }

    #[test]
    fn default_config_passes_clean() {
        let warnings = validate(&base_config()).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn zero_batch_size_is_fatal() {
        let mut config = base_config();
        config.sync.cleanup_batch_size = Some(0);
        assert!(matches!(
            validate(&config),
            Err(ConfigGuardRailError::ZeroCleanupBatch)
        ));
    }

    #[test]
    fn empty_selection_is_fatal() {
        let mut config = base_config();
        config.sync.requested_modules = Some(vec![]);
        assert!(matches!(
            validate(&config),
            Err(ConfigGuardRailError::EmptyModuleSelection)
        ));
    }

    #[test]
    fn memory_store_credentials_warn() {
        let mut config = base_config();
        config.store.user = Some("atlas".into());
        let warnings = validate(&config).unwrap();
        assert_eq!(
            warnings.0,
            vec![ConfigWarning::CredentialsIgnoredByMemoryStore]
        );
    }
}
