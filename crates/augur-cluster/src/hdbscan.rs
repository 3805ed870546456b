//! HDBSCAN density clustering
//!
//! Core distances, mutual reachability, a Prim minimum spanning tree,
//! single-linkage hierarchy, condensed tree and flat cluster selection.
//! Everything is deterministic: ties resolve to the lowest index.

use crate::embedder::{cosine_similarity, euclidean_distance};
use crate::error::ClusterError;
use serde::{Deserialize, Serialize};

/// Label given to points outside every selected cluster
pub const NOISE: i32 = -1;

/// Lambda used for zero-distance merges
const LAMBDA_MAX: f64 = 1e12;

/// How flat clusters are extracted from the condensed tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClusterSelectionMethod {
    /// Excess of Mass: the most persistent clusters
    #[default]
    EOM,
    /// Leaf clusters of the condensed tree only
    Leaf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    /// 1 - cosine similarity
    Cosine,
}

impl DistanceMetric {
    fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            DistanceMetric::Euclidean => euclidean_distance(a, b) as f64,
            DistanceMetric::Cosine => (1.0 - cosine_similarity(a, b) as f64).max(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HdbscanParams {
    /// Smallest group that counts as a cluster
    pub min_cluster_size: usize,
    /// Neighbourhood size (including the point itself) for core distances
    pub min_samples: usize,
    pub cluster_selection_method: ClusterSelectionMethod,
    pub metric: DistanceMetric,
}

impl Default for HdbscanParams {
    fn default() -> Self {
        Self::new(2)
    }
}

impl HdbscanParams {
    /// Params with `min_samples = min_cluster_size`
    pub fn new(min_cluster_size: usize) -> Self {
        Self {
            min_cluster_size,
            min_samples: min_cluster_size,
            cluster_selection_method: ClusterSelectionMethod::EOM,
            metric: DistanceMetric::Euclidean,
        }
    }

    pub fn with_min_samples(mut self, samples: usize) -> Self {
        self.min_samples = samples;
        self
    }

    pub fn with_selection_method(mut self, method: ClusterSelectionMethod) -> Self {
        self.cluster_selection_method = method;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.min_cluster_size < 2 {
            return Err(ClusterError::InvalidParameter(format!(
                "min_cluster_size must be >= 2, got {}",
                self.min_cluster_size
            )));
        }
        if self.min_samples < 1 {
            return Err(ClusterError::InvalidParameter(
                "min_samples must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Flat labels for `points`: `0..k` for clusters, [`NOISE`] otherwise
pub fn fit(points: &[Vec<f32>], params: &HdbscanParams) -> Result<Vec<i32>, ClusterError> {
    params.validate()?;
    let n = points.len();
    if let Some(first) = points.first() {
        let expected = first.len();
        if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| p.len() != expected) {
            return Err(ClusterError::DimensionMismatch {
                index,
                expected,
                actual: p.len(),
            });
        }
    }
    if n < 2 || n < params.min_cluster_size {
        return Ok(vec![NOISE; n]);
    }

    let distances = pairwise_distances(points, params.metric);
    let core = core_distances(&distances, n, params.min_samples);
    let mst = minimum_spanning_tree(&distances, &core, n);
    let hierarchy = single_linkage(&mst, n);
    let condensed = condense(&hierarchy, n, params.min_cluster_size);
    let selected = select_clusters(&condensed, params.cluster_selection_method);
    Ok(assign_labels(&condensed, &selected, n))
}

fn pairwise_distances(points: &[Vec<f32>], metric: DistanceMetric) -> Vec<f64> {
    let n = points.len();
    let mut distances = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = metric.distance(&points[i], &points[j]);
            distances[i * n + j] = d;
            distances[j * n + i] = d;
        }
    }
    distances
}

/// Distance to the `min_samples`-th nearest point, counting the point itself
fn core_distances(distances: &[f64], n: usize, min_samples: usize) -> Vec<f64> {
    let k = min_samples.min(n) - 1;
    (0..n)
        .map(|i| {
            let mut row = distances[i * n..(i + 1) * n].to_vec();
            row.sort_by(|a, b| a.total_cmp(b));
            row[k]
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    weight: f64,
}

/// Prim over the mutual reachability graph, O(n^2)
fn minimum_spanning_tree(distances: &[f64], core: &[f64], n: usize) -> Vec<Edge> {
    let reach = |i: usize, j: usize| distances[i * n + j].max(core[i]).max(core[j]);

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut best_from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n - 1);

    let mut current = 0;
    in_tree[0] = true;
    for _ in 1..n {
        for j in 0..n {
            if !in_tree[j] {
                let w = reach(current, j);
                if w < best[j] {
                    best[j] = w;
                    best_from[j] = current;
                }
            }
        }

        let mut next = None;
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            match next {
                Some(k) if best[j] >= best[k] => {}
                _ => next = Some(j),
            }
        }
        let Some(next) = next else { break };

        in_tree[next] = true;
        edges.push(Edge {
            a: best_from[next],
            b: next,
            weight: best[next],
        });
        current = next;
    }

    edges.sort_by(|x, y| x.weight.total_cmp(&y.weight));
    edges
}

/// Internal node `n + i` of the single-linkage tree
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn single_linkage(mst: &[Edge], n: usize) -> Vec<Merge> {
    let mut parent: Vec<usize> = (0..n).collect();
    let mut node_of: Vec<usize> = (0..n).collect();
    let mut size_of = vec![1usize; n];
    let mut merges = Vec::with_capacity(mst.len());

    for edge in mst {
        let ra = find(&mut parent, edge.a);
        let rb = find(&mut parent, edge.b);
        let size = size_of[ra] + size_of[rb];
        merges.push(Merge {
            left: node_of[ra],
            right: node_of[rb],
            distance: edge.weight,
            size,
        });
        parent[rb] = ra;
        size_of[ra] = size;
        node_of[ra] = n + merges.len() - 1;
    }
    merges
}

#[derive(Debug, Clone)]
struct CondensedCluster {
    parent: Option<usize>,
    birth: f64,
    stability: f64,
    children: Vec<usize>,
    /// Points that left the hierarchy while in this cluster
    members: Vec<usize>,
}

impl CondensedCluster {
    fn new(parent: Option<usize>, birth: f64) -> Self {
        Self {
            parent,
            birth,
            stability: 0.0,
            children: Vec::new(),
            members: Vec::new(),
        }
    }
}

fn lambda(distance: f64) -> f64 {
    if distance > 1.0 / LAMBDA_MAX {
        (1.0 / distance).min(LAMBDA_MAX)
    } else {
        LAMBDA_MAX
    }
}

fn node_size(merges: &[Merge], n: usize, node: usize) -> usize {
    if node < n {
        1
    } else {
        merges[node - n].size
    }
}

fn leaves(merges: &[Merge], n: usize, node: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(x) = stack.pop() {
        if x < n {
            out.push(x);
        } else {
            let m = &merges[x - n];
            stack.push(m.right);
            stack.push(m.left);
        }
    }
    out
}

/// Walk the hierarchy top-down keeping only splits where both sides have
/// at least `min_cluster_size` points. Cluster 0 is the root.
fn condense(merges: &[Merge], n: usize, min_cluster_size: usize) -> Vec<CondensedCluster> {
    let mut clusters = vec![CondensedCluster::new(None, 0.0)];
    let Some(root) = merges.len().checked_sub(1).map(|i| n + i) else {
        return clusters;
    };

    let mut stack = vec![(root, 0usize)];
    while let Some((node, label)) = stack.pop() {
        let merge = merges[node - n];
        let lam = lambda(merge.distance);
        let birth = clusters[label].birth;
        let left_size = node_size(merges, n, merge.left);
        let right_size = node_size(merges, n, merge.right);
        let left_big = left_size >= min_cluster_size;
        let right_big = right_size >= min_cluster_size;

        if left_big && right_big {
            clusters[label].stability += (lam - birth) * (left_size + right_size) as f64;
            for child in [merge.left, merge.right] {
                let id = clusters.len();
                clusters.push(CondensedCluster::new(Some(label), lam));
                clusters[label].children.push(id);
                stack.push((child, id));
            }
            // pop left first
            let len = stack.len();
            stack.swap(len - 1, len - 2);
            continue;
        }

        for (child, size, big) in [
            (merge.left, left_size, left_big),
            (merge.right, right_size, right_big),
        ] {
            if big {
                stack.push((child, label));
            } else {
                clusters[label].stability += (lam - birth) * size as f64;
                let fallen = leaves(merges, n, child);
                clusters[label].members.extend(fallen);
            }
        }
    }
    clusters
}

fn select_clusters(clusters: &[CondensedCluster], method: ClusterSelectionMethod) -> Vec<bool> {
    let mut selected = vec![false; clusters.len()];

    match method {
        ClusterSelectionMethod::Leaf => {
            for (id, cluster) in clusters.iter().enumerate().skip(1) {
                selected[id] = cluster.children.is_empty();
            }
        }
        ClusterSelectionMethod::EOM => {
            let mut subtree = vec![0.0; clusters.len()];
            // Children always have larger ids than their parent
            for id in (1..clusters.len()).rev() {
                let cluster = &clusters[id];
                let child_sum: f64 = cluster.children.iter().map(|c| subtree[*c]).sum();
                if cluster.children.is_empty() || cluster.stability >= child_sum {
                    selected[id] = true;
                    subtree[id] = cluster.stability;
                    deselect_descendants(clusters, &mut selected, id);
                } else {
                    subtree[id] = child_sum;
                }
            }
        }
    }
    selected
}

fn deselect_descendants(clusters: &[CondensedCluster], selected: &mut [bool], id: usize) {
    let mut stack: Vec<usize> = clusters[id].children.clone();
    while let Some(c) = stack.pop() {
        selected[c] = false;
        stack.extend(clusters[c].children.iter().copied());
    }
}

/// Each point takes the label of its nearest selected ancestor cluster
fn assign_labels(clusters: &[CondensedCluster], selected: &[bool], n: usize) -> Vec<i32> {
    let mut flat = vec![NOISE; clusters.len()];
    let mut next = 0;
    for (id, is_selected) in selected.iter().enumerate() {
        if *is_selected {
            flat[id] = next;
            next += 1;
        }
    }

    // Parents precede children, so one forward pass resolves ancestry
    let mut resolved = vec![NOISE; clusters.len()];
    for (id, cluster) in clusters.iter().enumerate() {
        resolved[id] = if selected[id] {
            flat[id]
        } else {
            cluster.parent.map_or(NOISE, |p| resolved[p])
        };
    }

    let mut labels = vec![NOISE; n];
    for (id, cluster) in clusters.iter().enumerate() {
        for &point in &cluster.members {
            labels[point] = resolved[id];
        }
    }
    labels
}
