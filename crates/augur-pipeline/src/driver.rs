//! Chains the stages over one thread's comments

use crate::error::PipelineError;
use crate::{extract_all, filter_noisy, identify_themes};
use augur_cache::{resolve_cache_dir, CacheStore};
use augur_cluster::{Embedder, HdbscanParams, RecursiveClusterer};
use augur_core::{AnalysisResult, Comment, Config, Prediction};
use augur_llm::{ModelBackend, ModelGateway};

/// Everything a run produced, stage by stage
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub filtered: Vec<Comment>,
    pub predictions: Vec<Prediction>,
    pub result: AnalysisResult,
}

pub struct Pipeline {
    gateway: ModelGateway,
    cache: CacheStore,
    clusterer: RecursiveClusterer,
    config: Config,
}

impl Pipeline {
    pub fn new(
        gateway: ModelGateway,
        cache: CacheStore,
        clusterer: RecursiveClusterer,
        config: Config,
    ) -> Self {
        Self {
            gateway,
            cache,
            clusterer,
            config,
        }
    }

    /// Wire up a pipeline from configuration. Rejects invalid settings
    /// before anything touches the network.
    pub fn from_config(
        backend: Box<dyn ModelBackend>,
        embedder: Box<dyn Embedder>,
        config: Config,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let cache = CacheStore::open(resolve_cache_dir(config.cache_dir.as_deref()))?;
        let gateway = ModelGateway::new(backend, config.gateway_retry.clone())
            .with_max_output_tokens(config.max_output_tokens);
        let params =
            HdbscanParams::new(config.min_cluster_size).with_min_samples(config.min_samples());
        let clusterer = RecursiveClusterer::new(embedder, params)
            .with_max_recursion_depth(config.max_recursion_depth)
            .with_split_threshold(config.split_threshold);
        Ok(Self::new(gateway, cache, clusterer, config))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.gateway.model_name()
    }

    pub fn run(&mut self, comments: &[Comment]) -> PipelineOutcome {
        if self.config.force_rerun {
            match self.cache.clear(Some(self.gateway.model_name())) {
                Ok(removed) => tracing::info!(removed, "cleared cached results for rerun"),
                Err(e) => tracing::warn!(error = %e, "failed to clear cache"),
            }
        }

        tracing::info!(comments = comments.len(), "filtering noisy comments");
        let filtered = filter_noisy(&self.gateway, &self.cache, comments, self.config.batch_size);

        tracing::info!(comments = filtered.len(), "extracting predictions");
        let predictions = extract_all(
            &self.gateway,
            &self.cache,
            &filtered,
            self.config.batch_size,
            &self.config.extraction_retry,
        );

        tracing::info!(predictions = predictions.len(), "identifying themes");
        let themes = identify_themes(&self.gateway, &self.cache, &mut self.clusterer, &predictions);

        PipelineOutcome {
            filtered,
            predictions,
            result: AnalysisResult::new(themes, self.gateway.model_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cache, gateway};
    use augur_cache::Stage;
    use augur_cluster::ClusterError;
    use augur_core::{Likelihood, RetryPolicy};

    struct Flat;

    impl Embedder for Flat {
        fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClusterError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn pipeline(replies: &[&str], config: Config) -> (tempfile::TempDir, Pipeline) {
        let (temp, store) = cache();
        let (gw, _) = gateway(replies);
        let clusterer = RecursiveClusterer::new(Box::new(Flat), HdbscanParams::new(2));
        (temp, Pipeline::new(gw, store, clusterer, config))
    }

    fn config() -> Config {
        Config {
            batch_size: 2,
            extraction_retry: RetryPolicy::immediate(1),
            ..Config::new()
        }
    }

    #[test]
    fn test_run_chains_stages() {
        let replies = [
            r#"{"is_noisy": [false, true]}"#,
            r#"{"predictions": [{"prediction": "Rust in the kernel by default", "probability": 0.75, "justification": "momentum"}]}"#,
            r#"{"themes": [{"theme": "Systems", "summary": "s", "predictions": ["Rust in the kernel by default"]}]}"#,
        ];
        let (_temp, mut p) = pipeline(&replies, config());
        let comments = vec![
            Comment::from_text("Rust will be the kernel default"),
            Comment::from_text("lol"),
        ];

        let outcome = p.run(&comments);
        assert_eq!(outcome.filtered.len(), 1);
        assert_eq!(outcome.predictions.len(), 1);
        assert_eq!(outcome.result.model, "test/scripted-model");
        assert_eq!(outcome.result.themes.len(), 1);
        assert_eq!(
            outcome.result.themes[0].predictions[0].category,
            Some(Likelihood::Likely)
        );
    }

    #[test]
    fn test_all_noise_skips_later_stages() {
        let (_temp, mut p) = pipeline(&[r#"{"is_noisy": [true]}"#], config());
        let outcome = p.run(&[Comment::from_text("+1")]);
        assert!(outcome.filtered.is_empty());
        assert!(outcome.predictions.is_empty());
        assert!(outcome.result.themes.is_empty());
    }

    #[test]
    fn test_force_rerun_clears_model_cache() {
        let (_temp, mut p) = pipeline(&[r#"{"is_noisy": [true]}"#], Config {
            force_rerun: true,
            ..config()
        });
        let stale = vec![Comment::from_text("+1")];
        p.cache()
            .save("test/scripted-model", Stage::Noise, &stale, &vec![false])
            .unwrap();

        let outcome = p.run(&stale);
        assert!(outcome.filtered.is_empty());
    }

    #[test]
    fn test_from_config_rejects_invalid_settings() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config {
            batch_size: 0,
            cache_dir: Some(temp.path().to_path_buf()),
            ..Config::new()
        };
        let backend = Box::new(crate::testing::Scripted::empty());
        let result = Pipeline::from_config(backend, Box::new(Flat), config);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_from_config_uses_configured_cache_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config {
            cache_dir: Some(temp.path().join("entries")),
            ..Config::new()
        };
        let backend = Box::new(crate::testing::Scripted::empty());
        let p = Pipeline::from_config(backend, Box::new(Flat), config).unwrap();
        assert_eq!(p.cache().dir(), temp.path().join("entries"));
        assert_eq!(p.model_name(), "test/scripted-model");
    }
}
