use std::path::PathBuf;
use thiserror::Error;

/// Startup configuration errors. These are the only fatal errors in a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("{0} environment variable not set")]
    MissingCredential(String),

    #[error("unknown model: {name}. Available models: {available}")]
    UnknownProvider { name: String, available: String },
}
