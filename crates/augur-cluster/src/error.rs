use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("invalid clustering parameter: {0}")]
    InvalidParameter(String),

    #[error("point {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("embedding failed: {0}")]
    Embedding(String),
}
