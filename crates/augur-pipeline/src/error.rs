use augur_cache::CacheError;
use augur_core::ConfigError;
use thiserror::Error;

/// Failures while assembling a pipeline. Once running, stages fail open.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
