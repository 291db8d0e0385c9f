//! Random forest training, hyperparameter search and inference.
//!
//! - [`tree`]: CART decision trees over `f64` features.
//! - [`random_forest`]: bagged ensembles of trees with averaged leaf probabilities.
//! - [`params`]: hyperparameters and the search grid.
//! - [`search`]: train/test split, stratified folds and exhaustive grid search.

pub mod params;
pub mod random_forest;
pub mod search;
pub mod tree;

pub use params::{ForestParams, GridPreset, ParamGrid};
pub use random_forest::RandomForest;
pub use search::{
    stratified_folds, train_test_split, CandidateScore, GridSearch, GridSearchResult, SplitIndices,
};
pub use tree::{DecisionTree, TreeNode};

/// A fitted model that scores one feature row at a time.
///
/// The predictor only needs class probabilities; the predicted class is their arg-max.
pub trait Classifier: Send + Sync {
    /// Probability of each class for `features`. Length equals [`Classifier::n_classes`].
    fn predict_proba(&self, features: &[f64]) -> Vec<f64>;

    fn n_classes(&self) -> usize;
}
