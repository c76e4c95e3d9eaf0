//! Bagged regression trees.
//!
//! A small CART implementation: every tree is grown on a bootstrap sample,
//! considers every feature at every split and minimises the summed squared
//! error of the two children. Trees are grown in parallel but each one draws
//! from its own seeded RNG, so a forest is fully determined by its data and
//! [`ForestConfig`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Hyperparameters for [`RandomForest::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single regression tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    fn fit(x: &[Vec<f64>], y: &[f64], sample: Vec<usize>, config: &ForestConfig) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, sample, 0, config);
        tree
    }

    /// Grows the subtree for `sample` and returns the index of its root.
    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        sample: Vec<usize>,
        depth: usize,
        config: &ForestConfig,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: mean(y, &sample),
        });

        if depth >= config.max_depth || sample.len() < config.min_samples_split.max(2) {
            return index;
        }
        let Some(split) = best_split(x, y, &sample) else {
            return index;
        };

        let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
            .iter()
            .partition(|&&i| x[i][split.feature] <= split.threshold);
        let left = self.grow(x, y, left_sample, depth + 1, config);
        let right = self.grow(x, y, right_sample, depth + 1, config);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Checks that the arena is a proper tree over `width` features.
    ///
    /// Children must point strictly forward and stay in bounds, so traversal
    /// always reaches a leaf.
    pub fn validate(&self, width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let len = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            else {
                continue;
            };
            if *feature >= width {
                return Err(format!(
                    "node {index} splits on feature {feature} of {width}"
                ));
            }
            for child in [*left, *right] {
                if child <= index || child >= len {
                    return Err(format!("node {index} has invalid child {child}"));
                }
            }
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "sample sizes are far below 2^52"
)]
fn mean(y: &[f64], sample: &[usize]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().map(|&i| y[i]).sum::<f64>() / sample.len() as f64
}

/// Finds the split minimising the children's summed squared error.
///
/// Returns `None` when no split improves on the parent, which includes pure
/// nodes and nodes whose rows are identical on every feature.
#[expect(
    clippy::cast_precision_loss,
    reason = "sample sizes are far below 2^52"
)]
fn best_split(x: &[Vec<f64>], y: &[f64], sample: &[usize]) -> Option<SplitCandidate> {
    let n = sample.len();
    let total_sum: f64 = sample.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = sample.iter().map(|&i| y[i] * y[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;
    if parent_sse <= f64::EPSILON {
        return None;
    }

    let width = x[sample[0]].len();
    let mut best: Option<SplitCandidate> = None;
    let mut order = sample.to_vec();

    for feature in 0..width {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let prev = order[k - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let lo = x[prev][feature];
            let hi = x[order[k]][feature];
            if hi <= lo {
                continue;
            }

            let left_n = k as f64;
            let right_n = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().is_none_or(|b| sse < b.sse) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    sse,
                });
            }
        }
    }

    best.filter(|b| b.sse < parent_sse)
}

/// An ensemble of [`RegressionTree`]s whose prediction is the mean of its trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Grows `config.n_estimators` trees on bootstrap samples of `(x, y)`.
    ///
    /// Returns `None` when there is nothing to fit or `x` and `y` disagree in
    /// length.
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: ForestConfig) -> Option<Self> {
        if x.is_empty() || x.len() != y.len() || config.n_estimators == 0 {
            return None;
        }
        let n = x.len();

        let trees = (0..config.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(t as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                RegressionTree::fit(x, y, sample, &config)
            })
            .collect();

        Some(Self { config, trees })
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "tree counts are small"
    )]
    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    /// Validates every tree; see [`RegressionTree::validate`].
    pub fn validate(&self, width: usize) -> Result<(), String> {
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(t, tree)| tree.validate(width).map_err(|e| format!("tree {t}: {e}")))
    }

    pub const fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}
