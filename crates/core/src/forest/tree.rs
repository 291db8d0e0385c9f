//! CART decision tree with Gini impurity.
//!
//! Nodes live in a flat array; the root is index 0 and children always have larger indices
//! than their parent. Leaves store the class distribution of the training samples that reached
//! them, so a tree yields probabilities and not just a vote.

use super::params::ForestParams;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// A node in the decision tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Samples with `features[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class probabilities of the samples that reached this leaf.
    Leaf { distribution: Vec<f64> },
}

impl TreeNode {
    pub const fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }
}

/// A fitted decision tree classifier.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    n_classes: usize,
}

impl DecisionTree {
    /// Grows a tree over `samples` (indices into `features`/`labels`, repeats allowed).
    pub(crate) fn grow(
        features: &[Vec<f64>],
        labels: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = features.first().map_or(0, Vec::len);
        let mut grower = Grower {
            features,
            labels,
            n_classes,
            n_features,
            max_features: max_features(n_features),
            params,
            rng,
            nodes: Vec::new(),
        };
        grower.grow(samples, 0);
        Self {
            nodes: grower.nodes,
            n_features,
            n_classes,
        }
    }

    /// Class distribution of the leaf `features` falls into.
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Most probable class; ties go to the lowest class index.
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(self.predict_proba(features))
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Tree depth (longest root-to-leaf path).
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    fn node_depth(&self, idx: usize) -> usize {
        match &self.nodes[idx] {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => {
                1 + self.node_depth(*left).max(self.node_depth(*right))
            }
        }
    }
}

/// Index of the largest value; the first one wins on ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Features examined per split: `floor(sqrt(n_features))`, at least one.
fn max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct Grower<'a, 'r> {
    features: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
    params: &'a ForestParams,
    rng: &'r mut StdRng,
    nodes: Vec<TreeNode>,
}

impl Grower<'_, '_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&samples);
        let n = samples.len();
        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if depth_reached
            || pure
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
        {
            return self.push_leaf(&counts, n);
        }

        let Some(split) = self.best_split(&samples, &counts) else {
            return self.push_leaf(&counts, n);
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.features[i][split.feature] <= split.threshold);

        // Reserve this node's slot before growing children so the root stays at index 0.
        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            distribution: Vec::new(),
        });
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn push_leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let total = n.max(1) as f64;
        let distribution = counts.iter().map(|&c| c as f64 / total).collect();
        self.nodes.push(TreeNode::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in samples {
            counts[self.labels[i]] += 1;
        }
        counts
    }

    /// Draws features in random order until `max_features` non-constant ones have been
    /// examined, and keeps the split with the lowest weighted Gini impurity.
    fn best_split(&mut self, samples: &[usize], counts: &[usize]) -> Option<SplitCandidate> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf;
        let parent_sum_sq: usize = counts.iter().map(|&c| c * c).sum();
        let parent_impurity = gini(parent_sum_sq, n);

        let mut order: Vec<usize> = (0..self.n_features).collect();
        order.shuffle(&mut *self.rng);

        let mut best: Option<SplitCandidate> = None;
        let mut examined = 0usize;
        let mut pairs: Vec<(f64, usize)> = Vec::with_capacity(n);

        for feature in order {
            if examined >= self.max_features {
                break;
            }

            pairs.clear();
            pairs.extend(
                samples
                    .iter()
                    .map(|&i| (self.features[i][feature], self.labels[i])),
            );
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            if pairs[0].0 == pairs[n - 1].0 {
                continue;
            }
            examined += 1;

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = counts.to_vec();
            let mut left_sum_sq = 0usize;
            let mut right_sum_sq = parent_sum_sq;

            for k in 0..n - 1 {
                let class = pairs[k].1;
                // (c+1)^2 - c^2 = 2c + 1, and symmetrically for removal.
                left_sum_sq += 2 * left_counts[class] + 1;
                left_counts[class] += 1;
                right_sum_sq -= 2 * right_counts[class] - 1;
                right_counts[class] -= 1;

                if pairs[k].0 == pairs[k + 1].0 {
                    continue;
                }
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let impurity = (n_left as f64 * gini(left_sum_sq, n_left)
                    + n_right as f64 * gini(right_sum_sq, n_right))
                    / n as f64;
                if impurity < parent_impurity
                    && best.as_ref().map_or(true, |b| impurity < b.impurity)
                {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (pairs[k].0 + pairs[k + 1].0) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

/// Gini impurity from the sum of squared class counts.
fn gini(sum_sq: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - sum_sq as f64 / (n * n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn grow(features: &[Vec<f64>], labels: &[usize], params: &ForestParams) -> DecisionTree {
        let mut rng = StdRng::seed_from_u64(1);
        let n_classes = labels.iter().max().map_or(0, |m| m + 1);
        DecisionTree::grow(
            features,
            labels,
            (0..labels.len()).collect(),
            n_classes,
            params,
            &mut rng,
        )
    }

    #[test]
    fn test_single_feature_split() {
        let features = vec![vec![1.0], vec![2.0], vec![8.0], vec![9.0]];
        let labels = vec![0, 0, 1, 1];
        let tree = grow(&features, &labels, &ForestParams::default());

        assert_eq!(tree.predict(&[1.5]), 0);
        assert_eq!(tree.predict(&[8.5]), 1);
        assert_eq!(tree.predict(&[5.0]), 0); // midpoint threshold is 5.0, <= goes left
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_pure_node_is_single_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![0, 0, 0];
        let tree = grow(&features, &labels, &ForestParams::default());
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_proba(&[42.0]), &[1.0]);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let features: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let labels = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let params = ForestParams {
            max_depth: Some(1),
            ..ForestParams::default()
        };
        let tree = grow(&features, &labels, &params);
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![9.0]];
        let labels = vec![0, 0, 0, 1];
        let params = ForestParams {
            min_samples_leaf: 2,
            ..ForestParams::default()
        };
        let tree = grow(&features, &labels, &params);
        // The only clean split isolates one sample, which the leaf minimum forbids.
        for node in &tree.nodes {
            if let TreeNode::Leaf { distribution } = node {
                assert!((distribution.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            }
        }
        let proba = tree.predict_proba(&[9.0]);
        assert!(proba[1] < 1.0);
    }

    #[test]
    fn test_leaf_distribution_sums_to_one() {
        let features = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0], vec![2.0, 5.0]];
        let labels = vec![0, 1, 1, 2];
        let tree = grow(&features, &labels, &ForestParams::default());
        let proba = tree.predict_proba(&[1.0, 0.0]);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((proba[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        assert_eq!(argmax(&[0.25, 0.5, 0.5]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(4, 2), 0.0); // [2, 0]
        assert!((gini(2, 2) - 0.5).abs() < 1e-12); // [1, 1]
    }
}
