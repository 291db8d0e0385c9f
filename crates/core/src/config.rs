//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Nothing on the request path reads environment variables; the binaries call
//! [`IntelConfig::from_lookup`] with `std::env::var` and tests pass a closure over a map.

use crate::constants::{
    CV_FOLDS, DATASET_FILENAME, DEFAULT_DATA_DIR, DEFAULT_REPORT_DIR,
    DEFAULT_REPORT_RETENTION_HOURS, DEFAULT_SEED, TEST_SPLIT_RATIO,
};
use crate::forest::{GridPreset, ParamGrid};
use crate::{IntelError, IntelResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_ADDR: &str = "ILLNESS_INTEL_ADDR";
pub const ENV_DATA_DIR: &str = "ILLNESS_INTEL_DATA_DIR";
pub const ENV_REPORT_DIR: &str = "ILLNESS_INTEL_REPORT_DIR";
pub const ENV_GRID: &str = "ILLNESS_INTEL_GRID";
pub const ENV_SEED: &str = "ILLNESS_INTEL_SEED";
pub const ENV_REPORT_RETENTION_HOURS: &str = "ILLNESS_INTEL_REPORT_RETENTION_HOURS";

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Process configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct IntelConfig {
    addr: String,
    data_dir: PathBuf,
    report_dir: PathBuf,
    grid: GridPreset,
    seed: u64,
    report_retention: Option<Duration>,
}

impl IntelConfig {
    pub fn new(
        addr: String,
        data_dir: PathBuf,
        report_dir: PathBuf,
        grid: GridPreset,
        seed: u64,
    ) -> IntelResult<Self> {
        if addr.trim().is_empty() {
            return Err(IntelError::InvalidInput(
                "listen address cannot be empty".into(),
            ));
        }
        Ok(Self {
            addr,
            data_dir,
            report_dir,
            grid,
            seed,
            report_retention: Some(hours(DEFAULT_REPORT_RETENTION_HOURS)),
        })
    }

    /// Builds the configuration from a key lookup, typically `|k| std::env::var(k).ok()`.
    ///
    /// Unset keys fall back to defaults. The data directory is resolved with
    /// [`resolve_data_dir`].
    ///
    /// # Errors
    ///
    /// Returns `IntelError::InvalidInput` for an unparsable grid preset, seed or retention, or
    /// when no data directory can be found.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> IntelResult<Self> {
        let addr = lookup(ENV_ADDR).unwrap_or_else(|| DEFAULT_ADDR.into());
        let data_dir = resolve_data_dir(lookup(ENV_DATA_DIR).map(PathBuf::from))?;
        let report_dir = lookup(ENV_REPORT_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR));
        let grid = match lookup(ENV_GRID) {
            Some(value) => value.parse()?,
            None => GridPreset::default(),
        };
        let seed = match lookup(ENV_SEED) {
            Some(value) => parse_seed(&value)?,
            None => DEFAULT_SEED,
        };
        let report_retention = match lookup(ENV_REPORT_RETENTION_HOURS) {
            Some(value) => parse_retention_hours(&value)?,
            None => Some(hours(DEFAULT_REPORT_RETENTION_HOURS)),
        };
        Ok(Self::new(addr, data_dir, report_dir, grid, seed)?
            .with_report_retention(report_retention))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub fn grid(&self) -> GridPreset {
        self.grid
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// How long reports are kept; `None` keeps them forever.
    pub fn report_retention(&self) -> Option<Duration> {
        self.report_retention
    }

    pub fn with_grid(mut self, grid: GridPreset) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn with_report_dir(mut self, report_dir: PathBuf) -> Self {
        self.report_dir = report_dir;
        self
    }

    pub fn with_report_retention(mut self, retention: Option<Duration>) -> Self {
        self.report_retention = retention;
        self
    }

    pub fn training(&self) -> TrainingConfig {
        TrainingConfig {
            grid: ParamGrid::from_preset(self.grid),
            seed: self.seed,
            ..TrainingConfig::default()
        }
    }
}

/// Inputs to the startup training pipeline.
#[derive(Clone, Debug)]
pub struct TrainingConfig {
    pub grid: ParamGrid,
    pub seed: u64,
    pub test_ratio: f64,
    pub folds: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            grid: ParamGrid::full(),
            seed: DEFAULT_SEED,
            test_ratio: TEST_SPLIT_RATIO,
            folds: CV_FOLDS,
        }
    }
}

pub fn parse_seed(value: &str) -> IntelResult<u64> {
    value.trim().parse().map_err(|_| {
        IntelError::InvalidInput(format!(
            "seed must be an unsigned integer, got '{value}'"
        ))
    })
}

fn hours(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(3600))
}

/// Parses a retention in whole hours. `0` disables pruning.
pub fn parse_retention_hours(value: &str) -> IntelResult<Option<Duration>> {
    let n: u64 = value.trim().parse().map_err(|_| {
        IntelError::InvalidInput(format!(
            "report retention must be a whole number of hours, got '{value}'"
        ))
    })?;
    Ok((n > 0).then(|| hours(n)))
}

/// Resolve the data directory without reading environment variables.
///
/// If `override_dir` is provided, it must contain `dataset.csv`. Otherwise this looks for
/// `data/` relative to the current working directory and then walks up from
/// `CARGO_MANIFEST_DIR`.
pub fn resolve_data_dir(override_dir: Option<PathBuf>) -> IntelResult<PathBuf> {
    fn looks_like_data_dir(path: &Path) -> bool {
        path.join(DATASET_FILENAME).is_file()
    }

    if let Some(data_dir) = override_dir {
        if looks_like_data_dir(&data_dir) {
            return Ok(data_dir);
        }
        return Err(IntelError::InvalidInput(format!(
            "{ENV_DATA_DIR} override {} does not contain {DATASET_FILENAME}",
            data_dir.display()
        )));
    }

    let cwd_relative = PathBuf::from(DEFAULT_DATA_DIR);
    if looks_like_data_dir(&cwd_relative) {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DEFAULT_DATA_DIR);
        if looks_like_data_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Err(IntelError::InvalidInput(format!(
        "could not locate {DEFAULT_DATA_DIR}/ directory containing {DATASET_FILENAME}"
    )))
}
