//! Content-addressed cache for model stage outputs

mod error;
pub mod io;
pub mod paths;
mod store;

pub use error::CacheError;
pub use paths::{output_file, resolve_cache_dir, CACHE_DIR_ENV};
pub use store::{sanitize_model_name, CacheStats, CacheStore, Stage};
