use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::error::ConfigLoadError;
use crate::models::{Config, MetricsSettings, StoreSettings, SyncSettings};

/// Source of environment values, swappable for tests.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEnv;

impl EnvSource for OsEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Env-driven configuration loader.
///
/// Reads `ATLAS_*` variables, applies defaults, and resolves secrets from
/// files where a `_FILE` variant is set. CLI flags are layered on top by
/// the binary after loading.
#[derive(Debug)]
pub struct ConfigLoader<E: EnvSource = OsEnv> {
    env: E,
}

impl Default for ConfigLoader<OsEnv> {
    fn default() -> Self {
        Self { env: OsEnv }
    }
}

impl<E: EnvSource> ConfigLoader<E> {
    pub fn with_env(env: E) -> Self {
        Self { env }
    }

    pub fn load(&self) -> Result<Config, ConfigLoadError> {
        Ok(Config {
            store: self.load_store()?,
            sync: self.load_sync()?,
            metrics: self.load_metrics()?,
        })
    }

    fn load_store(&self) -> Result<StoreSettings, ConfigLoadError> {
        let uri = self
            .non_empty("ATLAS_STORE_URI")
            .unwrap_or_else(|| StoreSettings::default().uri);
        Url::parse(&uri).map_err(|source| ConfigLoadError::InvalidStoreUri {
            uri: uri.clone(),
            source,
        })?;

        let password = match self.non_empty("ATLAS_STORE_PASSWORD") {
            Some(password) => Some(password),
            None => match self.non_empty("ATLAS_STORE_PASSWORD_FILE") {
                Some(path) => read_secret_file(Path::new(&path))?,
                None => None,
            },
        };

        Ok(StoreSettings {
            uri,
            user: self.non_empty("ATLAS_STORE_USER"),
            password,
            max_connection_lifetime: self
                .parse("ATLAS_STORE_MAX_CONNECTION_LIFETIME", parse_duration)?,
        })
    }

    fn load_sync(&self) -> Result<SyncSettings, ConfigLoadError> {
        Ok(SyncSettings {
            update_tag: self.parse("ATLAS_UPDATE_TAG", parse_i64)?,
            best_effort: self
                .parse("ATLAS_BEST_EFFORT", parse_bool)?
                .unwrap_or(false),
            requested_modules: self.non_empty("ATLAS_REQUESTED_MODULES").map(|raw| {
                raw.split(',')
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            }),
            cleanup_batch_size: self.parse("ATLAS_CLEANUP_BATCH_SIZE", parse_u64)?,
        })
    }

    fn load_metrics(&self) -> Result<MetricsSettings, ConfigLoadError> {
        Ok(MetricsSettings {
            enabled: self
                .parse("ATLAS_STATSD_ENABLED", parse_bool)?
                .unwrap_or(false),
            host: self.non_empty("ATLAS_STATSD_HOST"),
            port: self.parse("ATLAS_STATSD_PORT", parse_u16)?,
            prefix: self.non_empty("ATLAS_STATSD_PREFIX"),
        })
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.env
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parse<T>(
        &self,
        key: &str,
        parser: fn(&str) -> Result<T, String>,
    ) -> Result<Option<T>, ConfigLoadError> {
        match self.non_empty(key) {
            None => Ok(None),
            Some(raw) => parser(&raw).map(Some).map_err(|reason| {
                ConfigLoadError::InvalidEnvValue {
                    variable: key.to_string(),
                    value: raw,
                    reason,
                }
            }),
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected a boolean".to_string()),
    }
}

fn parse_i64(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>().map_err(|err| err.to_string())
}

fn parse_u64(raw: &str) -> Result<u64, String> {
    raw.parse::<u64>().map_err(|err| err.to_string())
}

fn parse_u16(raw: &str) -> Result<u16, String> {
    raw.parse::<u16>().map_err(|err| err.to_string())
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    humantime::parse_duration(raw).map_err(|err| err.to_string())
}

fn read_secret_file(path: &Path) -> Result<Option<String>, ConfigLoadError> {
    let contents =
        read_to_string(path).map_err(|source| ConfigLoadError::SecretFile {
            path: path.display().to_string(),
            source,
        })?;
    let secret = contents.trim().to_string();
    Ok((!secret.is_empty()).then_some(secret))
}
