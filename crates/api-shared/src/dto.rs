//! JSON request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A free-text symptom submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictReq {
    /// Comma-separated symptoms, e.g. `cough, fever, headache`.
    pub symptoms: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionRes {
    pub symptoms: String,
    pub disease: String,
    /// Percentage in `[0, 100]`, two decimals.
    pub confidence: f64,
    pub description: String,
    pub precaution: String,
    pub recognised: Vec<String>,
    pub unrecognised: Vec<String>,
    /// 32 lowercase hex characters.
    pub report_id: String,
    pub report_url: String,
}

/// Body returned with every 4xx/5xx from the JSON API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    /// Tokens that were not recognised, when that is why the request failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrecognised: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForestParamsRes {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClassMetricsRes {
    pub disease: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// What was trained at startup and how well it did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelSummaryRes {
    pub best_params: ForestParamsRes,
    pub cv_accuracy: f64,
    pub candidates_evaluated: usize,
    pub test_accuracy: f64,
    pub macro_f1: f64,
    pub classes: Vec<ClassMetricsRes>,
    pub n_train: usize,
    pub n_test: usize,
    pub vocabulary_size: usize,
    pub n_classes: usize,
    /// RFC 3339 timestamp.
    pub trained_at: String,
}
