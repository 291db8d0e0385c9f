//! Held-out split, stratified cross-validation folds and exhaustive grid search.

use super::params::{ForestParams, ParamGrid};
use super::random_forest::RandomForest;
use crate::metrics::accuracy;
use crate::{IntelError, IntelResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

/// Row indices of a train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n` with `seed` and holds out `ceil(n * test_ratio)` rows.
///
/// # Errors
///
/// Returns `IntelError::Training` if either side of the split would be empty.
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> IntelResult<SplitIndices> {
    if !(0.0..1.0).contains(&test_ratio) {
        return Err(IntelError::InvalidInput(format!(
            "test ratio must lie in [0, 1), got {test_ratio}"
        )));
    }
    let n_test = (n as f64 * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(IntelError::Training(format!(
            "cannot split {n} cases with test ratio {test_ratio}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

/// Assigns each position of `labels` to one of `k` folds, dealing every class round-robin so
/// each fold keeps roughly the class balance of the whole. Returns the positions held out by
/// each fold.
///
/// # Errors
///
/// Returns `IntelError::Training` if there are fewer samples than folds.
pub fn stratified_folds(labels: &[usize], k: usize) -> IntelResult<Vec<Vec<usize>>> {
    if k < 2 {
        return Err(IntelError::InvalidInput(
            "cross-validation needs at least 2 folds".into(),
        ));
    }
    if labels.len() < k {
        return Err(IntelError::Training(format!(
            "{} samples cannot fill {k} folds",
            labels.len()
        )));
    }

    let n_classes = labels.iter().max().map_or(0, |m| m + 1);
    let mut seen = vec![0usize; n_classes];
    let mut offset = 0usize;
    let mut class_offset = vec![0usize; n_classes];
    // Stagger each class's starting fold so small classes do not all land in fold 0.
    for (class, start) in class_offset.iter_mut().enumerate() {
        *start = offset % k;
        offset += labels.iter().filter(|&&l| l == class).count();
    }

    let mut folds = vec![Vec::new(); k];
    for (pos, &label) in labels.iter().enumerate() {
        let fold = (class_offset[label] + seen[label]) % k;
        seen[label] += 1;
        folds[fold].push(pos);
    }
    Ok(folds)
}

/// Cross-validation result for one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub params: ForestParams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

/// Outcome of a grid search.
#[derive(Debug, Clone, Serialize)]
pub struct GridSearchResult {
    pub best: ForestParams,
    pub best_score: f64,
    pub candidates: Vec<CandidateScore>,
}

/// Exhaustive search over a [`ParamGrid`] scored by mean k-fold accuracy.
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    folds: usize,
    seed: u64,
}

impl GridSearch {
    pub fn new(grid: ParamGrid, folds: usize, seed: u64) -> Self {
        Self { grid, folds, seed }
    }

    /// Scores every candidate on every fold of `features`/`labels`.
    ///
    /// The best candidate is the one with the highest mean accuracy; ties go to the earliest
    /// candidate in grid order. (candidate, fold) pairs run in parallel but every forest is
    /// seeded deterministically, so the result matches a sequential run.
    ///
    /// # Errors
    ///
    /// Returns `IntelError` if the grid is empty, folds cannot be built, or a fit fails.
    pub fn run(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> IntelResult<GridSearchResult> {
        let candidates = self.grid.candidates(self.seed);
        if candidates.is_empty() {
            return Err(IntelError::InvalidInput("parameter grid is empty".into()));
        }

        let folds = stratified_folds(labels, self.folds)?;
        let fold_train: Vec<Vec<usize>> = folds
            .iter()
            .map(|held_out| {
                let mut mask = vec![true; labels.len()];
                held_out.iter().for_each(|&i| mask[i] = false);
                (0..labels.len()).filter(|&i| mask[i]).collect()
            })
            .collect();

        tracing::info!(
            "grid search: {} candidates x {} folds = {} fits",
            candidates.len(),
            folds.len(),
            candidates.len() * folds.len()
        );

        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| -> IntelResult<f64> {
                let forest = RandomForest::fit_subset(
                    features,
                    labels,
                    &fold_train[f],
                    n_classes,
                    candidates[c],
                )?;
                let predicted: Vec<usize> = folds[f]
                    .iter()
                    .map(|&i| forest.predict(&features[i]))
                    .collect();
                let truth: Vec<usize> = folds[f].iter().map(|&i| labels[i]).collect();
                Ok(accuracy(&truth, &predicted))
            })
            .collect::<IntelResult<Vec<f64>>>()?;

        let k = folds.len();
        let scored: Vec<CandidateScore> = candidates
            .into_iter()
            .enumerate()
            .map(|(c, params)| {
                let fold_scores = scores[c * k..(c + 1) * k].to_vec();
                let mean_score = fold_scores.iter().sum::<f64>() / k as f64;
                CandidateScore {
                    params,
                    fold_scores,
                    mean_score,
                }
            })
            .collect();

        let mut best = 0usize;
        for (i, candidate) in scored.iter().enumerate() {
            if candidate.mean_score > scored[best].mean_score {
                best = i;
            }
        }

        tracing::info!(
            "best candidate: {} (mean CV accuracy {:.4})",
            scored[best].params,
            scored[best].mean_score
        );

        Ok(GridSearchResult {
            best: scored[best].params,
            best_score: scored[best].mean_score,
            candidates: scored,
        })
    }
}
