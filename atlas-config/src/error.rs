use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("invalid store URI {uri:?}: {source}")]
    InvalidStoreUri {
        uri: String,
        source: url::ParseError,
    },

    #[error("invalid value {value:?} for {variable}: {reason}")]
    InvalidEnvValue {
        variable: String,
        value: String,
        reason: String,
    },

    #[error("failed to read secret file {path}: {source}")]
    SecretFile {
        path: String,
        source: std::io::Error,
    },
}
