//! Random forest classifier.
//!
//! Each tree is grown on a bootstrap sample (or on every sample when bootstrapping is off)
//! with `sqrt(n_features)` candidate features per split. Class probabilities are the mean of
//! the trees' leaf distributions.
//!
//! Tree `t` draws from an RNG seeded with `(seed, t)`, so a forest is reproducible no matter
//! how rayon schedules the trees.

use super::params::ForestParams;
use super::tree::{argmax, DecisionTree};
use super::Classifier;
use crate::{IntelError, IntelResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// A fitted random forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    params: ForestParams,
}

impl RandomForest {
    /// Fits a forest on every row of `features`.
    ///
    /// # Errors
    ///
    /// Returns `IntelError` if the inputs are empty or inconsistent, or `params` is invalid.
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: ForestParams,
    ) -> IntelResult<Self> {
        let all: Vec<usize> = (0..labels.len()).collect();
        Self::fit_subset(features, labels, &all, n_classes, params)
    }

    /// Fits a forest on the rows listed in `subset`.
    pub fn fit_subset(
        features: &[Vec<f64>],
        labels: &[usize],
        subset: &[usize],
        n_classes: usize,
        params: ForestParams,
    ) -> IntelResult<Self> {
        params.validate()?;
        if features.len() != labels.len() {
            return Err(IntelError::Training(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if subset.is_empty() {
            return Err(IntelError::Training("no training samples".into()));
        }
        let n_features = features[subset[0]].len();
        if n_features == 0 || subset.iter().any(|&i| features[i].len() != n_features) {
            return Err(IntelError::Training(
                "feature rows must share a non-zero width".into(),
            ));
        }
        if let Some(&bad) = subset.iter().map(|&i| &labels[i]).find(|&&l| l >= n_classes) {
            return Err(IntelError::Training(format!(
                "label {bad} out of range for {n_classes} classes"
            )));
        }

        let trees = (0..params.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(tree_seed(params.seed, t));
                let samples = if params.bootstrap {
                    (0..subset.len())
                        .map(|_| subset[rng.gen_range(0..subset.len())])
                        .collect()
                } else {
                    subset.to_vec()
                };
                DecisionTree::grow(features, labels, samples, n_classes, &params, &mut rng)
            })
            .collect();

        Ok(Self {
            trees,
            n_features,
            n_classes,
            params,
        })
    }

    /// Mean class distribution across trees.
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (p, q) in proba.iter_mut().zip(tree.predict_proba(features)) {
                *p += q;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        proba
    }

    /// Most probable class for one sample.
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }

    pub fn predict_batch(&self, samples: &[Vec<f64>]) -> Vec<usize> {
        samples.iter().map(|s| self.predict(s)).collect()
    }

    /// Individual tree votes for a single sample (useful for debugging).
    pub fn tree_predictions(&self, features: &[f64]) -> Vec<usize> {
        self.trees.iter().map(|t| t.predict(features)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub const fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Average tree depth across the forest.
    pub fn avg_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }

    /// Total number of nodes across all trees.
    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        RandomForest::predict_proba(self, features)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}

fn tree_seed(seed: u64, tree: usize) -> u64 {
    seed ^ (tree as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well separated clusters in two dimensions.
    fn clusters() -> (Vec<Vec<f64>>, Vec<usize>) {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.5, 0.5],
            vec![1.0, 0.0],
            vec![1.5, 0.5],
            vec![5.0, 5.0],
            vec![5.5, 5.5],
            vec![6.0, 5.0],
            vec![6.5, 5.5],
        ];
        (features, vec![0, 0, 0, 0, 1, 1, 1, 1])
    }

    fn params(n_estimators: usize) -> ForestParams {
        ForestParams {
            n_estimators,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_predicts_training_clusters() {
        let (x, y) = clusters();
        let rf = RandomForest::fit(&x, &y, 2, params(10)).unwrap();
        assert_eq!(rf.predict_batch(&x), y);
        assert_eq!(rf.n_trees(), 10);
        assert_eq!(rf.n_features(), 2);
        assert_eq!(rf.n_classes(), 2);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = clusters();
        let rf = RandomForest::fit(&x, &y, 2, params(10)).unwrap();
        for sample in &x {
            let proba = rf.predict_proba(sample);
            assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = clusters();
        let a = RandomForest::fit(&x, &y, 2, params(8)).unwrap();
        let b = RandomForest::fit(&x, &y, 2, params(8)).unwrap();
        let probe = [3.0, 2.0];
        assert_eq!(a.predict_proba(&probe), b.predict_proba(&probe));
        assert_eq!(a.tree_predictions(&probe), b.tree_predictions(&probe));
        assert_eq!(a.total_nodes(), b.total_nodes());
    }

    #[test]
    fn test_without_bootstrap_every_tree_sees_all_samples() {
        let (x, y) = clusters();
        let no_bootstrap = ForestParams {
            bootstrap: false,
            ..params(5)
        };
        let rf = RandomForest::fit(&x, &y, 2, no_bootstrap).unwrap();
        for sample in &x {
            let proba = rf.predict_proba(sample);
            assert!(proba.iter().any(|&p| (p - 1.0).abs() < 1e-12));
        }
    }

    #[test]
    fn test_fit_subset_uses_only_listed_rows() {
        let (x, y) = clusters();
        let rf = RandomForest::fit_subset(&x, &y, &[0, 1, 2, 3], 2, params(3)).unwrap();
        let proba = rf.predict_proba(&[6.0, 5.0]);
        assert_eq!(proba, vec![1.0, 0.0]);
    }

    #[test]
    fn test_invalid_inputs_error() {
        let (x, y) = clusters();
        assert!(RandomForest::fit(&x, &y[..3], 2, params(3)).is_err());
        assert!(RandomForest::fit(&[], &[], 2, params(3)).is_err());
        assert!(RandomForest::fit(&x, &y, 1, params(3)).is_err());
        assert!(RandomForest::fit(&x, &y, 2, params(0)).is_err());
    }
}
