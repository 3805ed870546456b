#![allow(dead_code)]

use augur_cache::CacheStore;
use augur_cluster::{ClusterError, Embedder};
use augur_core::{Prediction, RetryPolicy};
use augur_llm::{GenerationRequest, ModelBackend, ModelError, ModelGateway};
use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Which stage a request belongs to, read off its response schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Noise,
    Predictions,
    Themes,
}

fn stage_of(request: &GenerationRequest<'_>) -> Option<Stage> {
    let required = request.json_schema?.get("required")?.get(0)?.as_str()?;
    match required {
        "is_noisy" => Some(Stage::Noise),
        "predictions" => Some(Stage::Predictions),
        "themes" => Some(Stage::Themes),
        _ => None,
    }
}

/// Backend that answers through a closure and counts calls per stage
pub struct MockBackend<F> {
    respond: F,
    calls: Rc<RefCell<Vec<Stage>>>,
}

impl<F> MockBackend<F>
where
    F: Fn(Stage, &str) -> String,
{
    pub fn new(respond: F) -> (Self, Rc<RefCell<Vec<Stage>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                respond,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl<F> ModelBackend for MockBackend<F>
where
    F: Fn(Stage, &str) -> String,
{
    fn model_name(&self) -> &str {
        "mock/test-model"
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ModelError> {
        let stage = stage_of(request).ok_or(ModelError::EmptyResponse)?;
        self.calls.borrow_mut().push(stage);
        Ok((self.respond)(stage, request.prompt))
    }
}

pub fn gateway<F>(respond: F) -> (ModelGateway, Rc<RefCell<Vec<Stage>>>)
where
    F: Fn(Stage, &str) -> String + 'static,
{
    let (backend, calls) = MockBackend::new(respond);
    (
        ModelGateway::new(Box::new(backend), RetryPolicy::immediate(2)),
        calls,
    )
}

/// Bag-of-words vectors: each token hashed into a fixed bucket, then
/// normalised. Texts sharing most words land close together.
pub struct HashingEmbedder {
    pub dims: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dims: 64 }
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClusterError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; self.dims];
                for token in text.split_whitespace() {
                    let mut hasher = DefaultHasher::new();
                    token.to_lowercase().hash(&mut hasher);
                    v[(hasher.finish() % self.dims as u64) as usize] += 1.0;
                }
                let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    v.iter_mut().for_each(|x| *x /= norm);
                }
                v
            })
            .collect())
    }
}

/// Places each known text at a fixed point on a line; unknown texts sit at the origin
#[derive(Default)]
pub struct LineEmbedder {
    pub positions: HashMap<String, f32>,
}

impl LineEmbedder {
    pub fn place(&mut self, text: &str, position: f32) {
        self.positions.insert(text.to_string(), position);
    }
}

impl Embedder for LineEmbedder {
    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClusterError> {
        Ok(texts
            .iter()
            .map(|t| vec![self.positions.get(t).copied().unwrap_or(0.0), 0.0])
            .collect())
    }
}

pub fn temp_cache() -> (tempfile::TempDir, CacheStore) {
    let temp = tempfile::TempDir::new().unwrap();
    let store = CacheStore::open(temp.path().join("cache")).unwrap();
    (temp, store)
}

pub fn prediction(text: &str, probability: f64) -> Prediction {
    Prediction::new(text, probability, "test justification")
}
