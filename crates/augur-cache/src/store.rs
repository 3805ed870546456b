//! Flat-file cache keyed by model, stage and input fingerprint

use crate::error::CacheError;
use crate::io::write_json_pretty;
use augur_core::Fingerprint;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Pipeline stage an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Noise,
    Predictions,
    Themes,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Noise => "noise",
            Stage::Predictions => "predictions",
            Stage::Themes => "themes",
        }
    }

    pub fn all() -> [Stage; 3] {
        [Stage::Noise, Stage::Predictions, Stage::Themes]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of what is on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub by_stage: BTreeMap<Stage, usize>,
    pub by_model: BTreeMap<String, usize>,
}

/// Parsed `{model}_{stage}_{hash}.json` file name
struct EntryName {
    model: String,
    stage: Stage,
}

impl EntryName {
    fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".json")?;
        let (rest, hash) = stem.rsplit_once('_')?;
        if hash.is_empty() {
            return None;
        }
        Stage::all().into_iter().find_map(|stage| {
            rest.strip_suffix(stage.as_str())
                .and_then(|m| m.strip_suffix('_'))
                .filter(|m| !m.is_empty())
                .map(|model| EntryName {
                    model: model.to_string(),
                    stage,
                })
        })
    }
}

/// Model names become file-name safe: `/`, `-` and `:` map to `_`
pub fn sanitize_model_name(model_name: &str) -> String {
    model_name.replace(['/', '-', ':'], "_")
}

/// Cache store over a single directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open (and create if needed) a cache directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First 8 hex chars of MD5 over the concatenated fingerprints
    pub fn content_hash<F: Fingerprint>(inputs: &[F]) -> String {
        let mut joined = String::new();
        for input in inputs {
            joined.push_str(&input.fingerprint());
        }
        let digest = format!("{:x}", md5::compute(joined.as_bytes()));
        digest[..8].to_string()
    }

    pub fn entry_path<F: Fingerprint>(&self, model_name: &str, stage: Stage, inputs: &[F]) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}.json",
            sanitize_model_name(model_name),
            stage,
            Self::content_hash(inputs)
        ))
    }

    /// Cached value for these inputs; unreadable or corrupt entries are misses
    pub fn load<T, F>(&self, model_name: &str, stage: Stage, inputs: &[F]) -> Option<T>
    where
        T: DeserializeOwned,
        F: Fingerprint,
    {
        let path = self.entry_path(model_name, stage, inputs);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cache entry");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => {
                tracing::debug!(%stage, path = %path.display(), "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache file is corrupted");
                None
            }
        }
    }

    pub fn save<T, F>(
        &self,
        model_name: &str,
        stage: Stage,
        inputs: &[F],
        value: &T,
    ) -> Result<(), CacheError>
    where
        T: Serialize,
        F: Fingerprint,
    {
        let path = self.entry_path(model_name, stage, inputs);
        write_json_pretty(&path, value).map_err(|e| CacheError::io(&path, e))?;
        tracing::debug!(%stage, path = %path.display(), "cache saved");
        Ok(())
    }

    /// Remove one model's entries, or every entry when `model_name` is None.
    /// Returns the number of files removed.
    pub fn clear(&self, model_name: Option<&str>) -> Result<usize, CacheError> {
        let wanted = model_name.map(sanitize_model_name);
        let mut removed = 0;
        for (path, entry) in self.entries()? {
            let matches = match &wanted {
                Some(model) => entry.model == *model,
                None => true,
            };
            if matches {
                std::fs::remove_file(&path).map_err(|e| CacheError::io(&path, e))?;
                removed += 1;
            }
        }
        tracing::info!(removed, model = model_name.unwrap_or("*"), "cache cleared");
        Ok(removed)
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut stats = CacheStats::default();
        for (path, entry) in self.entries()? {
            stats.entries += 1;
            stats.total_bytes += std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            *stats.by_stage.entry(entry.stage).or_insert(0) += 1;
            *stats.by_model.entry(entry.model).or_insert(0) += 1;
        }
        Ok(stats)
    }

    fn entries(&self) -> Result<Vec<(PathBuf, EntryName)>, CacheError> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(&self.dir, e)),
        };

        let mut entries = Vec::new();
        for item in read_dir {
            let item = item.map_err(|e| CacheError::io(&self.dir, e))?;
            let path = item.path();
            if !path.is_file() {
                continue;
            }
            let parsed = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(EntryName::parse);
            if let Some(entry) = parsed {
                entries.push((path, entry));
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_core::{Comment, Prediction};

    fn store() -> (tempfile::TempDir, CacheStore) {
        let temp = tempfile::TempDir::new().unwrap();
        let store = CacheStore::open(temp.path().join("cache")).unwrap();
        (temp, store)
    }

    #[test]
    fn test_save_then_load() {
        let (_temp, store) = store();
        let batch = vec![Comment::from_text("a"), Comment::from_text("b")];

        store
            .save("openai/gpt-4", Stage::Noise, &batch, &vec![true, false])
            .unwrap();
        let loaded: Option<Vec<bool>> = store.load("openai/gpt-4", Stage::Noise, &batch);
        assert_eq!(loaded, Some(vec![true, false]));
    }

    #[test]
    fn test_miss_for_other_stage_or_model() {
        let (_temp, store) = store();
        let batch = vec![Comment::from_text("a")];
        store.save("openai/gpt-4", Stage::Noise, &batch, &vec![true]).unwrap();

        let other_stage: Option<Vec<bool>> = store.load("openai/gpt-4", Stage::Predictions, &batch);
        let other_model: Option<Vec<bool>> = store.load("groq/llama3", Stage::Noise, &batch);
        assert!(other_stage.is_none());
        assert!(other_model.is_none());
    }

    #[test]
    fn test_file_name_format() {
        let (_temp, store) = store();
        let path = store.entry_path("openai/gpt-4-turbo", Stage::Themes, &["x"]);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("openai_gpt_4_turbo_themes_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "openai_gpt_4_turbo_themes_".len() + 8 + ".json".len());
    }

    #[test]
    fn test_ollama_tag_is_file_name_safe() {
        let (_temp, store) = store();
        let path = store.entry_path("ollama/llama2:13b", Stage::Noise, &["x"]);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("ollama_llama2_13b_noise_"));

        store.save("ollama/llama2:13b", Stage::Noise, &["x"], &vec![true]).unwrap();
        assert_eq!(store.clear(Some("ollama/llama2:13b")).unwrap(), 1);
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let ab = CacheStore::content_hash(&["a", "b"]);
        let ba = CacheStore::content_hash(&["b", "a"]);
        assert_ne!(ab, ba);
        assert_eq!(ab, CacheStore::content_hash(&["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_comment_hash_ignores_metadata() {
        let a = vec![Comment::new("same", 0, "alice", "now")];
        let b = vec![Comment::new("same", 2, "bob", "later")];
        assert_eq!(CacheStore::content_hash(&a), CacheStore::content_hash(&b));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let (_temp, store) = store();
        let inputs = vec![Prediction::new("p", 0.5, "j")];
        let path = store.entry_path("m", Stage::Themes, &inputs);
        std::fs::write(&path, "{ not json").unwrap();

        let loaded: Option<serde_json::Value> = store.load("m", Stage::Themes, &inputs);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_clear_single_model_leaves_prefix_siblings() {
        let (_temp, store) = store();
        store.save("gpt", Stage::Noise, &["a"], &vec![false]).unwrap();
        store.save("gpt-4", Stage::Noise, &["a"], &vec![false]).unwrap();
        store.save("gpt-4", Stage::Themes, &["b"], &Vec::<String>::new()).unwrap();

        assert_eq!(store.clear(Some("gpt")).unwrap(), 1);
        let remaining: Option<Vec<bool>> = store.load("gpt-4", Stage::Noise, &["a"]);
        assert_eq!(remaining, Some(vec![false]));
        assert_eq!(store.stats().unwrap().entries, 2);
    }

    #[test]
    fn test_clear_all_keeps_foreign_files() {
        let (_temp, store) = store();
        store.save("a/b", Stage::Noise, &["a"], &vec![false]).unwrap();
        store.save("c/d", Stage::Predictions, &["a"], &Vec::<Prediction>::new()).unwrap();
        std::fs::write(store.dir().join("notes.txt"), "keep me").unwrap();

        assert_eq!(store.clear(None).unwrap(), 2);
        assert!(store.dir().join("notes.txt").exists());
    }

    #[test]
    fn test_stats_counts_by_stage_and_model() {
        let (_temp, store) = store();
        store.save("openai/gpt-4", Stage::Noise, &["a"], &vec![false]).unwrap();
        store.save("openai/gpt-4", Stage::Noise, &["b"], &vec![true]).unwrap();
        store.save("groq/llama3", Stage::Themes, &["c"], &Vec::<String>::new()).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.by_stage.get(&Stage::Noise), Some(&2));
        assert_eq!(stats.by_model.get("openai_gpt_4"), Some(&2));
        assert_eq!(stats.by_model.get("groq_llama3"), Some(&1));
        assert!(stats.total_bytes > 0);
    }

    #[test]
    fn test_entry_name_parse() {
        let entry = EntryName::parse("openai_gpt_4_predictions_0a1b2c3d.json").unwrap();
        assert_eq!(entry.model, "openai_gpt_4");
        assert_eq!(entry.stage, Stage::Predictions);
        assert!(EntryName::parse("random.json").is_none());
        assert!(EntryName::parse("_noise_abcd1234.json").is_none());
    }
}
