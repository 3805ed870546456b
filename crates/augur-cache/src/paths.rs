//! Path resolution for cache and output files

use std::path::{Path, PathBuf};

/// Environment variable overriding the default cache directory
pub const CACHE_DIR_ENV: &str = "AUGUR_CACHE_DIR";

const DEFAULT_CACHE_DIR: &str = "cache";

/// Configured directory, else `$AUGUR_CACHE_DIR`, else `./cache`
pub fn resolve_cache_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }
    match std::env::var_os(CACHE_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_CACHE_DIR),
    }
}

/// Result file for a model: `predictions_data_<suffix>.json`, where the
/// suffix is the part of the model name after the provider prefix
pub fn output_file(output_dir: &Path, model_name: &str) -> PathBuf {
    let suffix = model_name
        .split_once('/')
        .map(|(_, model)| model)
        .unwrap_or(model_name)
        .replace(['/', ':'], "_");
    output_dir.join(format!("predictions_data_{}.json", suffix))
}
