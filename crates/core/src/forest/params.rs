//! Forest hyperparameters and the search grid.

use crate::{IntelError, IntelResult};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Hyperparameters of one random forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: crate::constants::DEFAULT_SEED,
        }
    }
}

impl ForestParams {
    /// Rejects parameter combinations no tree can be grown with.
    pub fn validate(&self) -> IntelResult<()> {
        if self.n_estimators == 0 {
            return Err(IntelError::InvalidInput(
                "n_estimators must be at least 1".into(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(IntelError::InvalidInput(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(IntelError::InvalidInput(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(IntelError::InvalidInput(
                "max_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        write!(
            f,
            "n_estimators={}, max_depth={}, min_samples_split={}, min_samples_leaf={}, bootstrap={}",
            self.n_estimators, depth, self.min_samples_split, self.min_samples_leaf, self.bootstrap
        )
    }
}

/// Values searched for each hyperparameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
    pub bootstrap: Vec<bool>,
}

impl ParamGrid {
    /// The exhaustive grid: 3 × 4 × 3 × 3 × 2 = 216 candidates.
    pub fn full() -> Self {
        Self {
            n_estimators: vec![100, 200, 300],
            max_depth: vec![None, Some(10), Some(20), Some(30)],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 2, 4],
            bootstrap: vec![true, false],
        }
    }

    /// A small grid for development runs.
    pub fn quick() -> Self {
        Self {
            n_estimators: vec![50],
            max_depth: vec![None, Some(20)],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1],
            bootstrap: vec![true, false],
        }
    }

    pub fn from_preset(preset: GridPreset) -> Self {
        match preset {
            GridPreset::Full => Self::full(),
            GridPreset::Quick => Self::quick(),
        }
    }

    /// Cartesian product of the grid.
    ///
    /// Keys are iterated alphabetically (`bootstrap`, `max_depth`, `min_samples_leaf`,
    /// `min_samples_split`, `n_estimators`) with the last key varying fastest, so candidate
    /// order is stable and "earliest best" is well defined.
    pub fn candidates(&self, seed: u64) -> Vec<ForestParams> {
        let mut out = Vec::with_capacity(self.len());
        for &bootstrap in &self.bootstrap {
            for &max_depth in &self.max_depth {
                for &min_samples_leaf in &self.min_samples_leaf {
                    for &min_samples_split in &self.min_samples_split {
                        for &n_estimators in &self.n_estimators {
                            out.push(ForestParams {
                                n_estimators,
                                max_depth,
                                min_samples_split,
                                min_samples_leaf,
                                bootstrap,
                                seed,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len()
            * self.max_depth.len()
            * self.min_samples_split.len()
            * self.min_samples_leaf.len()
            * self.bootstrap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named grids selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridPreset {
    #[default]
    Full,
    Quick,
}

impl FromStr for GridPreset {
    type Err = IntelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(GridPreset::Full),
            "quick" => Ok(GridPreset::Quick),
            other => Err(IntelError::InvalidInput(format!(
                "unknown grid preset '{other}' (expected 'full' or 'quick')"
            ))),
        }
    }
}

impl fmt::Display for GridPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridPreset::Full => f.write_str("full"),
            GridPreset::Quick => f.write_str("quick"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_grid_size() {
        let grid = ParamGrid::full();
        assert_eq!(grid.len(), 216);
        assert_eq!(grid.candidates(42).len(), 216);
    }

    #[test]
    fn test_candidates_last_key_varies_fastest() {
        let candidates = ParamGrid::full().candidates(7);
        assert_eq!(candidates[0].n_estimators, 100);
        assert_eq!(candidates[1].n_estimators, 200);
        assert_eq!(candidates[3].min_samples_split, 5);
        assert!(candidates[0].bootstrap);
        assert!(!candidates[215].bootstrap);
        assert!(candidates.iter().all(|c| c.seed == 7));
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("full".parse::<GridPreset>().unwrap(), GridPreset::Full);
        assert_eq!(" Quick ".parse::<GridPreset>().unwrap(), GridPreset::Quick);
        assert!("huge".parse::<GridPreset>().is_err());
    }

    #[test]
    fn test_validate_rejects_degenerate_params() {
        assert!(ForestParams::default().validate().is_ok());
        let zero_trees = ForestParams {
            n_estimators: 0,
            ..ForestParams::default()
        };
        assert!(zero_trees.validate().is_err());
        let tiny_split = ForestParams {
            min_samples_split: 1,
            ..ForestParams::default()
        };
        assert!(tiny_split.validate().is_err());
    }
}
