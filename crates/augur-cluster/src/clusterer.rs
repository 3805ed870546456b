//! Recursive clustering of predictions by embedding

use crate::embedder::Embedder;
use crate::error::ClusterError;
use crate::hdbscan::{self, HdbscanParams};
use augur_core::{Cluster, Prediction};
use std::collections::BTreeMap;

const DEFAULT_MAX_DEPTH: usize = 3;
const DEFAULT_SPLIT_THRESHOLD: usize = 100;

enum Work {
    /// Cluster these members; child ids hang off `prefix`
    Split {
        members: Vec<usize>,
        depth: usize,
        prefix: Option<String>,
    },
    Emit {
        id: String,
        depth: usize,
        members: Vec<usize>,
    },
}

/// Splits predictions into density clusters, re-clustering any group that
/// is still larger than the split threshold
pub struct RecursiveClusterer {
    embedder: Box<dyn Embedder>,
    params: HdbscanParams,
    max_recursion_depth: usize,
    split_threshold: usize,
}

impl RecursiveClusterer {
    pub fn new(embedder: Box<dyn Embedder>, params: HdbscanParams) -> Self {
        Self {
            embedder,
            params,
            max_recursion_depth: DEFAULT_MAX_DEPTH,
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
        }
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_split_threshold(mut self, threshold: usize) -> Self {
        self.split_threshold = threshold;
        self
    }

    pub fn params(&self) -> &HdbscanParams {
        &self.params
    }

    /// Flat list of clusters with hierarchical ids. Every prediction lands
    /// in exactly one cluster. Embeddings are computed once per call.
    pub fn cluster(&mut self, predictions: &[Prediction]) -> Result<Vec<Cluster>, ClusterError> {
        if predictions.is_empty() {
            return Ok(Vec::new());
        }
        self.params.validate()?;

        let texts: Vec<String> = predictions.iter().map(|p| p.prediction.clone()).collect();
        let embeddings = self.embedder.embed(&texts)?;
        if embeddings.len() != predictions.len() {
            return Err(ClusterError::Embedding(format!(
                "expected {} embeddings, got {}",
                predictions.len(),
                embeddings.len()
            )));
        }

        let mut out = Vec::new();
        let mut work = vec![Work::Split {
            members: (0..predictions.len()).collect(),
            depth: 0,
            prefix: None,
        }];

        while let Some(item) = work.pop() {
            match item {
                Work::Emit { id, depth, members } => {
                    out.push(Cluster {
                        cluster_id: id,
                        depth,
                        predictions: members.iter().map(|&i| predictions[i].clone()).collect(),
                    });
                }
                Work::Split {
                    members,
                    depth,
                    prefix,
                } => {
                    let points: Vec<Vec<f32>> =
                        members.iter().map(|&i| embeddings[i].clone()).collect();
                    let labels = hdbscan::fit(&points, &self.params)?;

                    // Noise (-1) sorts first
                    let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
                    for (&member, &label) in members.iter().zip(labels.iter()) {
                        groups.entry(label).or_default().push(member);
                    }
                    tracing::debug!(
                        depth,
                        prefix = prefix.as_deref().unwrap_or(""),
                        size = members.len(),
                        groups = groups.len(),
                        "clustered"
                    );

                    let mut next = Vec::with_capacity(groups.len());
                    for (label, group) in groups {
                        let id = match &prefix {
                            Some(p) => format!("{}-{}", p, label),
                            None => label.to_string(),
                        };
                        if group.len() > self.split_threshold && depth < self.max_recursion_depth {
                            next.push(Work::Split {
                                members: group,
                                depth: depth + 1,
                                prefix: Some(id),
                            });
                        } else {
                            next.push(Work::Emit {
                                id,
                                depth,
                                members: group,
                            });
                        }
                    }
                    // Reverse so groups come off the stack in label order
                    work.extend(next.into_iter().rev());
                }
            }
        }

        tracing::info!(
            predictions = predictions.len(),
            clusters = out.len(),
            "clustering complete"
        );
        Ok(out)
    }
}
