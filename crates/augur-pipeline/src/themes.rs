//! Theme labeling over clustered predictions

use augur_cache::{CacheStore, Stage};
use augur_cluster::RecursiveClusterer;
use augur_core::prompts::IDENTIFY_THEMES;
use augur_core::{Cluster, Prediction, Theme};
use augur_llm::{ModelGateway, ThemeLabel, ThemeSchema};

/// Cluster the predictions and ask the model to name each cluster's themes.
/// The whole result is cached against the full prediction set.
pub fn identify_themes(
    gateway: &ModelGateway,
    cache: &CacheStore,
    clusterer: &mut RecursiveClusterer,
    predictions: &[Prediction],
) -> Vec<Theme> {
    if predictions.is_empty() {
        return Vec::new();
    }
    let model = gateway.model_name();
    if let Some(themes) = cache.load::<Vec<Theme>, _>(model, Stage::Themes, predictions) {
        return themes;
    }

    let clusters = match clusterer.cluster(predictions) {
        Ok(clusters) => clusters,
        Err(e) => {
            tracing::warn!(error = %e, "clustering failed, labeling all predictions together");
            vec![Cluster {
                cluster_id: "0".to_string(),
                depth: 0,
                predictions: predictions.to_vec(),
            }]
        }
    };

    let mut themes = Vec::new();
    let mut all_labeled = true;
    for cluster in &clusters {
        match label_cluster(gateway, cluster) {
            Some(labels) => {
                themes.extend(labels.iter().map(|label| match_theme(label, predictions)));
            }
            None => {
                tracing::warn!(cluster = %cluster.cluster_id, "theme labeling failed");
                all_labeled = false;
                themes.push(unlabeled(cluster));
            }
        }
    }

    if all_labeled {
        if let Err(e) = cache.save(model, Stage::Themes, predictions, &themes) {
            tracing::warn!(error = %e, "failed to cache themes");
        }
    }
    tracing::info!(
        clusters = clusters.len(),
        themes = themes.len(),
        "theme identification complete"
    );
    themes
}

fn label_cluster(gateway: &ModelGateway, cluster: &Cluster) -> Option<Vec<ThemeLabel>> {
    let texts: Vec<&str> = cluster
        .predictions
        .iter()
        .map(|p| p.prediction.as_str())
        .collect();
    let joined = texts.join("\n");
    let prompt = IDENTIFY_THEMES.render(&[("predictions", joined.as_str())]);
    gateway.invoke(&prompt, &ThemeSchema)
}

/// Resolve a label's prediction strings against the known set by exact
/// text. Unknown strings are dropped; so are repeats within the theme.
fn match_theme(label: &ThemeLabel, known: &[Prediction]) -> Theme {
    let mut matched: Vec<usize> = Vec::new();
    for text in &label.predictions {
        match known.iter().position(|p| p.prediction == *text) {
            Some(index) if !matched.contains(&index) => matched.push(index),
            Some(_) => {}
            None => {
                tracing::debug!(theme = %label.theme, prediction = %text, "dropping unknown prediction")
            }
        }
    }
    Theme {
        theme: label.theme.clone(),
        summary: label.summary.clone(),
        predictions: ranked(matched.into_iter().map(|i| &known[i])),
    }
}

fn unlabeled(cluster: &Cluster) -> Theme {
    Theme {
        theme: format!("Unlabeled cluster {}", cluster.cluster_id),
        summary: "The model could not label this cluster".to_string(),
        predictions: ranked(cluster.predictions.iter()),
    }
}

/// Categorized copies, probability descending; stable for ties
fn ranked<'a>(predictions: impl Iterator<Item = &'a Prediction>) -> Vec<Prediction> {
    let mut out: Vec<Prediction> = predictions.map(Prediction::categorized).collect();
    out.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cache, gateway};
    use augur_cluster::{ClusterError, Embedder, HdbscanParams};
    use augur_core::Likelihood;

    /// Everything at one point: a single noise group
    struct Flat;

    impl Embedder for Flat {
        fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClusterError> {
            Ok(texts.iter().map(|_| vec![0.0, 0.0]).collect())
        }
    }

    struct Offline;

    impl Embedder for Offline {
        fn embed(&mut self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ClusterError> {
            Err(ClusterError::Embedding("offline".into()))
        }
    }

    fn clusterer(embedder: Box<dyn Embedder>) -> RecursiveClusterer {
        RecursiveClusterer::new(embedder, HdbscanParams::new(5))
    }

    fn predictions() -> Vec<Prediction> {
        vec![
            Prediction::new("AI writes most code", 0.3, "j1"),
            Prediction::new("Fusion power plant online", 0.1, "j2"),
            Prediction::new("Remote work stays", 0.8, "j3"),
            Prediction::new("Another tie", 0.3, "j4"),
        ]
    }

    #[test]
    fn test_hallucinated_prediction_dropped_theme_kept() {
        let (_temp, store) = cache();
        let reply = r#"{"themes": [
            {"theme": "Energy", "summary": "s", "predictions": ["Cold fusion by Friday"]},
            {"theme": "Work", "summary": "s", "predictions": ["AI writes most code", "Remote work stays", "Another tie", "AI writes most code"]}
        ]}"#;
        let (gw, _) = gateway(&[reply]);
        let mut c = clusterer(Box::new(Flat));

        let themes = identify_themes(&gw, &store, &mut c, &predictions());
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].theme, "Energy");
        assert!(themes[0].predictions.is_empty());

        let texts: Vec<&str> = themes[1].predictions.iter().map(|p| p.prediction.as_str()).collect();
        assert_eq!(texts, vec!["Remote work stays", "AI writes most code", "Another tie"]);
        assert_eq!(themes[1].predictions[0].category, Some(Likelihood::Likely));
    }

    #[test]
    fn test_result_cached_and_reused() {
        let (_temp, store) = cache();
        let reply = r#"{"themes": [{"theme": "All", "summary": "s", "predictions": ["Remote work stays"]}]}"#;
        let (gw, prompts) = gateway(&[reply]);
        let mut c = clusterer(Box::new(Flat));

        let first = identify_themes(&gw, &store, &mut c, &predictions());
        let second = identify_themes(&gw, &store, &mut c, &predictions());
        assert_eq!(first, second);
        assert_eq!(prompts.borrow().len(), 1);
    }

    #[test]
    fn test_labeling_failure_falls_back_and_skips_cache() {
        let (_temp, store) = cache();
        let (gw, _) = gateway(&["I cannot help with that"]);
        let mut c = clusterer(Box::new(Flat));
        let input = predictions();

        let themes = identify_themes(&gw, &store, &mut c, &input);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].theme, "Unlabeled cluster -1");
        assert_eq!(themes[0].predictions.len(), 4);
        assert_eq!(themes[0].predictions[0].prediction, "Remote work stays");

        let cached: Option<Vec<Theme>> = store.load("test/scripted-model", Stage::Themes, &input);
        assert!(cached.is_none());
    }

    #[test]
    fn test_clustering_failure_labels_everything_together() {
        let (_temp, store) = cache();
        let reply = r#"[{"theme": "Misc", "summary": "s", "predictions": ["Fusion power plant online"]}]"#;
        let (gw, prompts) = gateway(&[reply]);
        let mut c = clusterer(Box::new(Offline));

        let themes = identify_themes(&gw, &store, &mut c, &predictions());
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].predictions[0].category, Some(Likelihood::Unlikely));
        assert!(prompts.borrow()[0].contains("AI writes most code\nFusion power plant online"));
    }

    #[test]
    fn test_empty_input_makes_no_calls() {
        let (_temp, store) = cache();
        let (gw, prompts) = gateway(&[]);
        let mut c = clusterer(Box::new(Flat));
        assert!(identify_themes(&gw, &store, &mut c, &[]).is_empty());
        assert!(prompts.borrow().is_empty());
    }
}
