//! Configuration for the analysis pipeline

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "augur.json";

/// Retry schedule: `delay *= backoff_factor` after every failed attempt,
/// plus uniform jitter in `[-jitter, +jitter]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_secs: f64,
    pub backoff_factor: f64,
    pub jitter_secs: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_secs: f64, backoff_factor: f64, jitter_secs: f64) -> Self {
        Self {
            max_attempts,
            base_delay_secs,
            backoff_factor,
            jitter_secs,
        }
    }

    /// Policy that retries without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, 0.0, 1.0, 0.0)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.base_delay_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field,
                reason: "max_attempts must be >= 1".to_string(),
            });
        }
        if !(self.backoff_factor >= 1.0) {
            return Err(ConfigError::Invalid {
                field,
                reason: format!("backoff_factor must be >= 1, got {}", self.backoff_factor),
            });
        }
        if !(self.base_delay_secs >= 0.0) || !(self.jitter_secs >= 0.0) {
            return Err(ConfigError::Invalid {
                field,
                reason: "delays must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1.0, 2.0, 0.1)
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Comments per model invocation
    pub batch_size: usize,

    /// Smallest group HDBSCAN will call a cluster
    pub min_cluster_size: usize,

    /// Neighbourhood size for core distances (defaults to min_cluster_size)
    pub min_samples: Option<usize>,

    /// How many times an oversized cluster may be split again
    pub max_recursion_depth: usize,

    /// Clusters larger than this are re-clustered
    pub split_threshold: usize,

    /// Clear this model's cache before running
    pub force_rerun: bool,

    /// Retries around every model call
    pub gateway_retry: RetryPolicy,

    /// Whole-batch retries in the extraction stage
    pub extraction_retry: RetryPolicy,

    /// Cache directory; unset falls back to `$AUGUR_CACHE_DIR`, then `./cache`
    pub cache_dir: Option<PathBuf>,
    pub output_dir: PathBuf,

    pub request_timeout_secs: u64,
    pub max_output_tokens: u32,
}

impl Config {
    pub fn new() -> Self {
        Self {
            batch_size: 5,
            min_cluster_size: 2,
            min_samples: None,
            max_recursion_depth: 3,
            split_threshold: 100,
            force_rerun: false,
            gateway_retry: RetryPolicy::default(),
            extraction_retry: RetryPolicy::new(3, 1.0, 2.0, 0.0),
            cache_dir: None,
            output_dir: PathBuf::from("outputs"),
            request_timeout_secs: 120,
            max_output_tokens: 4000,
        }
    }

    /// Read a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Explicit path, else `augur.json` in the working directory, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            tracing::debug!(path = %fallback.display(), "loading config");
            return Self::load(fallback);
        }
        Ok(Self::new())
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples.unwrap_or(self.min_cluster_size)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_size",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.min_cluster_size < 2 {
            return Err(ConfigError::Invalid {
                field: "min_cluster_size",
                reason: format!("must be >= 2, got {}", self.min_cluster_size),
            });
        }
        if self.min_samples() == 0 {
            return Err(ConfigError::Invalid {
                field: "min_samples",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.split_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "split_threshold",
                reason: "must be >= 1".to_string(),
            });
        }
        self.gateway_retry.validate("gateway_retry")?;
        self.extraction_retry.validate("extraction_retry")?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
