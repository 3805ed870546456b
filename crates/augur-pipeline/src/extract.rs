//! Prediction extraction stage

use augur_cache::{CacheStore, Stage};
use augur_core::prompts::EVALUATE_PREDICTIONS;
use augur_core::{Comment, Prediction, RetryPolicy};
use augur_llm::{retry, AttemptError, ModelGateway, PredictionSchema};

/// Predictions found in one batch. The whole batch is retried under
/// `policy`; exhaustion yields an empty list.
pub fn extract(
    gateway: &ModelGateway,
    cache: &CacheStore,
    batch: &[Comment],
    policy: &RetryPolicy,
) -> Vec<Prediction> {
    if batch.is_empty() {
        return Vec::new();
    }
    let model = gateway.model_name();
    if let Some(predictions) = cache.load::<Vec<Prediction>, _>(model, Stage::Predictions, batch) {
        return predictions;
    }

    let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
    let joined = texts.join("\n");
    let prompt = EVALUATE_PREDICTIONS.render(&[("comments", joined.as_str())]);

    let outcome = retry(policy, "extraction", |_| {
        gateway
            .invoke(&prompt, &PredictionSchema)
            .ok_or_else(|| AttemptError::Transient("no predictions parsed".to_string()))
    });

    match outcome {
        Some(predictions) => {
            if let Err(e) = cache.save(model, Stage::Predictions, batch, &predictions) {
                tracing::warn!(error = %e, "failed to cache predictions");
            }
            predictions
        }
        None => {
            tracing::warn!(size = batch.len(), "extraction failed, batch yields no predictions");
            Vec::new()
        }
    }
}

/// Extraction over `comments` in batches of `batch_size`, concatenated in order
pub fn extract_all(
    gateway: &ModelGateway,
    cache: &CacheStore,
    comments: &[Comment],
    batch_size: usize,
    policy: &RetryPolicy,
) -> Vec<Prediction> {
    let mut predictions = Vec::new();
    for (index, batch) in comments.chunks(batch_size.max(1)).enumerate() {
        let found = extract(gateway, cache, batch, policy);
        tracing::debug!(batch = index, found = found.len(), "extracted batch");
        predictions.extend(found);
    }
    tracing::info!(
        comments = comments.len(),
        predictions = predictions.len(),
        "extraction complete"
    );
    predictions
}
