//! Constants used throughout the Illness Intel core crate.
//!
//! File names, encoding offsets and fallback strings live here so the loader, encoder,
//! predictor and report exporter agree on them.

/// Name of the disease column in every input table.
pub const DISEASE_COLUMN: &str = "Disease";

/// Filename of the symptom/disease training matrix.
pub const DATASET_FILENAME: &str = "dataset.csv";

/// Filename of the disease description table.
pub const DESCRIPTION_FILENAME: &str = "symptom_Description.csv";

/// Filename of the disease precaution table.
pub const PRECAUTION_FILENAME: &str = "symptom_precaution.csv";

/// Default directory holding the three input tables when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default directory for generated reports.
pub const DEFAULT_REPORT_DIR: &str = "reports";

/// Hours a generated report is kept before startup pruning removes it.
pub const DEFAULT_REPORT_RETENTION_HOURS: u64 = 24;

/// Number of symptom slots in a feature row.
pub const MAX_SYMPTOMS: usize = 17;

/// First code handed out by the symptom vocabulary.
pub const SYMPTOM_CODE_OFFSET: u32 = 101;

/// Numeric value of an empty (padding) slot.
pub const PADDING_CODE: u32 = 0;

/// Seed used for the train/test split and the forest when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Fraction of cases held out for evaluation.
pub const TEST_SPLIT_RATIO: f64 = 0.2;

/// Number of cross-validation folds used by the grid search.
pub const CV_FOLDS: usize = 5;

/// Filename offered to the user when downloading a report.
pub const REPORT_DOWNLOAD_FILENAME: &str = "disease_prediction_report.pdf";

/// Extension of stored report files.
pub const REPORT_EXTENSION: &str = "pdf";

/// Fallback when a disease has no description.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Fallback when a disease has no precautions.
pub const NO_PRECAUTION: &str = "No precaution available.";
