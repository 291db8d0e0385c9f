//! # Illness Intel Core
//!
//! Core logic for the Illness Intel disease predictor.
//!
//! This crate loads the symptom tables, trains a random forest, and turns free-text symptom
//! lists into a diagnosis and a downloadable PDF report:
//! - [`dataset`] and [`knowledge`]: CSV loading and disease descriptions/precautions
//! - [`encoding`]: symptom vocabulary, label encoder and fixed-width feature rows
//! - [`forest`]: decision trees, random forests and grid search
//! - [`context`] and [`predictor`]: the trained bundle and the per-request prediction flow
//! - [`report`]: PDF rendering and report storage
//!
//! **No API concerns**: HTTP handlers, HTML rendering and the CLI belong in `api-rest`,
//! `api-shared` and `cli`.

pub mod config;
pub mod constants;
pub mod context;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod forest;
pub mod knowledge;
pub mod metrics;
pub mod predictor;
pub mod report;
pub mod report_id;
pub mod validation;

pub use config::{IntelConfig, TrainingConfig};
pub use context::{InferenceContext, TrainingSummary};
pub use dataset::{load_dataset, normalise, Dataset, SymptomTable};
pub use encoding::{FeatureRow, LabelEncoder, Slot, SymptomVocabulary};
pub use error::{IntelError, IntelResult, PredictError};
pub use forest::{Classifier, ForestParams, GridPreset, ParamGrid, RandomForest};
pub use knowledge::DiseaseKnowledge;
pub use metrics::ClassificationReport;
pub use predictor::{Diagnosis, Prediction, Predictor};
pub use report::{ExportedReport, ReportExporter};
pub use report_id::ReportId;
