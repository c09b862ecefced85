//! Bagged regression trees
//!
//! A small CART implementation (squared-error splits) and a bootstrap
//! ensemble over it. All randomness flows from one seeded generator so a
//! fit is reproducible for a given dataset and seed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Minimum improvement in squared error for a split to be kept
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Maximum depth (unlimited when `None`)
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

/// A single regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    /// Fit on the rows of `x`/`y` selected by `indices` (duplicates allowed)
    pub fn fit(x: &[Vec<f64>], y: &[f64], indices: &[usize], params: TreeParams) -> Self {
        let mut indices = indices.to_vec();
        let root = build_node(x, y, &mut indices, 0, params);
        Self { root }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    node = if v <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }
}

fn mean_of(y: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn build_node(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &mut [usize],
    depth: usize,
    params: TreeParams,
) -> Node {
    let value = mean_of(y, indices);
    let depth_reached = params.max_depth.map(|d| depth >= d).unwrap_or(false);
    if indices.len() < params.min_samples_split.max(2) || depth_reached {
        return Node::Leaf { value };
    }

    let Some((feature, threshold)) = best_split(x, y, indices) else {
        return Node::Leaf { value };
    };

    // Partition in place: rows going left first
    let mut boundary = 0;
    for i in 0..indices.len() {
        if x[indices[i]][feature] <= threshold {
            indices.swap(i, boundary);
            boundary += 1;
        }
    }
    if boundary == 0 || boundary == indices.len() {
        return Node::Leaf { value };
    }
    let (left_idx, right_idx) = indices.split_at_mut(boundary);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_node(x, y, left_idx, depth + 1, params)),
        right: Box::new(build_node(x, y, right_idx, depth + 1, params)),
    }
}

/// Best (feature, threshold) by total squared error, if any split helps
fn best_split(x: &[Vec<f64>], y: &[f64], indices: &[usize]) -> Option<(usize, f64)> {
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;
    if parent_sse <= MIN_SPLIT_GAIN {
        return None;
    }

    let n_features = x.get(indices[0]).map(Vec::len).unwrap_or(0);
    let mut best: Option<(usize, f64, f64)> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..n_features {
        sorted.sort_by(|&a, &b| {
            x[a][feature]
                .partial_cmp(&x[b][feature])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for pos in 1..n {
            let prev = sorted[pos - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let lo = x[prev][feature];
            let hi = x[sorted[pos]][feature];
            if lo >= hi {
                continue;
            }

            let left_n = pos as f64;
            let right_n = (n - pos) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.map(|(_, _, b)| sse < b).unwrap_or(true) {
                best = Some((feature, split_threshold(lo, hi), sse));
            }
        }
    }

    best.filter(|(_, _, sse)| parent_sse - sse > MIN_SPLIT_GAIN)
        .map(|(feature, threshold, _)| (feature, threshold))
}

/// Midpoint between two distinct sorted values that still separates them.
/// Adjacent floats round the midpoint up to `hi` and an infinite `hi`
/// overflows it, so both fall back to `lo`.
fn split_threshold(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi || !mid.is_finite() {
        lo
    } else {
        mid
    }
}

/// Settings for a bagged ensemble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub tree: TreeParams,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            seed: 42,
        }
    }
}

/// Ensemble of regression trees, each fit on a bootstrap sample
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: ForestParams) -> Self {
        let mut rng = StdRng::seed_from_u64(params.seed);
        Self::fit_with_rng(x, y, params, &mut rng)
    }

    pub fn fit_with_rng(x: &[Vec<f64>], y: &[f64], params: ForestParams, rng: &mut StdRng) -> Self {
        let n = x.len().min(y.len());
        if n == 0 {
            return Self { trees: Vec::new() };
        }
        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, &sample, params.tree)
            })
            .collect();
        Self { trees }
    }

    /// Mean of the trees' predictions
    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    /// Coefficient of determination on the given rows
    pub fn score(&self, x: &[Vec<f64>], y: &[f64]) -> f64 {
        r2_score(y, &self.predict_batch(x))
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

/// Coefficient of determination
///
/// With zero target variance the score is 1 for an exact fit and 0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Shuffle row indices and hold out `ceil(n * test_fraction)` of them
///
/// The held-out partition is clamped so both sides are non-empty when `n >= 2`.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    if n < 2 {
        return (indices, Vec::new());
    }
    let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);
    let train = indices.split_off(n_test);
    (train, indices)
}
