//! Text embedding seam

use crate::error::ClusterError;
use fastembed::TextEmbedding;

/// Turns texts into fixed-dimension vectors, one per text, in order
pub trait Embedder {
    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClusterError>;
}

/// Sentence embeddings via fastembed's default model. The model is
/// downloaded and loaded on first use.
#[derive(Default)]
pub struct FastEmbedder {
    model: Option<TextEmbedding>,
}

impl FastEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    fn model(&mut self) -> Result<&mut TextEmbedding, ClusterError> {
        if self.model.is_none() {
            tracing::info!("loading sentence embedding model");
            let model = TextEmbedding::try_new(Default::default())
                .map_err(|e| ClusterError::Embedding(e.to_string()))?;
            self.model = Some(model);
        }
        self.model
            .as_mut()
            .ok_or_else(|| ClusterError::Embedding("model not loaded".to_string()))
    }
}

impl Embedder for FastEmbedder {
    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClusterError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self
            .model()?
            .embed(texts.to_vec(), None)
            .map_err(|e| ClusterError::Embedding(e.to_string()))?;
        if vectors.len() != texts.len() {
            return Err(ClusterError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < 1e-8 || norm_b < 1e-8 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 1e-6); // orthogonal
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_euclidean_distance() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(euclidean_distance(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_empty_input_skips_model_load() {
        let mut embedder = FastEmbedder::new();
        assert!(embedder.embed(&[]).unwrap().is_empty());
        assert!(embedder.model.is_none());
    }
}
