//! Noise filter stage

use augur_cache::{CacheStore, Stage};
use augur_core::prompts::FILTER_NOISY_COMMENTS;
use augur_core::Comment;
use augur_llm::{ModelGateway, NoiseSchema};

/// Comments judged not noisy, in their original order. A batch that cannot
/// be classified is kept whole.
pub fn filter_noisy(
    gateway: &ModelGateway,
    cache: &CacheStore,
    comments: &[Comment],
    batch_size: usize,
) -> Vec<Comment> {
    let batch_size = batch_size.max(1);
    let mut kept = Vec::with_capacity(comments.len());

    for (index, batch) in comments.chunks(batch_size).enumerate() {
        let flags = classify_batch(gateway, cache, batch);
        tracing::debug!(
            batch = index,
            size = batch.len(),
            noisy = flags.iter().filter(|f| **f).count(),
            "classified batch"
        );
        kept.extend(
            batch
                .iter()
                .zip(flags)
                .filter(|(_, noisy)| !noisy)
                .map(|(comment, _)| comment.clone()),
        );
    }

    tracing::info!(
        total = comments.len(),
        kept = kept.len(),
        "noise filter complete"
    );
    kept
}

/// One flag per comment; `true` means noisy
fn classify_batch(gateway: &ModelGateway, cache: &CacheStore, batch: &[Comment]) -> Vec<bool> {
    let model = gateway.model_name();
    if let Some(flags) = cache.load::<Vec<bool>, _>(model, Stage::Noise, batch) {
        if flags.len() == batch.len() {
            return flags;
        }
        tracing::warn!(
            expected = batch.len(),
            got = flags.len(),
            "cached noise flags have wrong length, reclassifying"
        );
    }

    let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
    let joined = texts.join("\n");
    let prompt = FILTER_NOISY_COMMENTS.render(&[("comments", joined.as_str())]);

    match gateway.invoke(&prompt, &NoiseSchema::new(batch.len())) {
        Some(flags) => {
            if let Err(e) = cache.save(model, Stage::Noise, batch, &flags) {
                tracing::warn!(error = %e, "failed to cache noise flags");
            }
            flags
        }
        None => {
            tracing::warn!(size = batch.len(), "noise classification failed, keeping batch");
            vec![false; batch.len()]
        }
    }
}
