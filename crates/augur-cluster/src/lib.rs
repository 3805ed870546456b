//! Embedding-based density clustering of predictions

mod clusterer;
pub mod embedder;
mod error;
pub mod hdbscan;

pub use clusterer::RecursiveClusterer;
pub use embedder::{Embedder, FastEmbedder};
pub use error::ClusterError;
pub use hdbscan::{ClusterSelectionMethod, DistanceMetric, HdbscanParams, NOISE};
