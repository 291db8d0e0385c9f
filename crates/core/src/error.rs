use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IntelError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read {path}: {source}", path = path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CSV {path}: {source}", path = path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("{path} is missing required column `{column}`", path = path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error(
        "{path} declares {found} symptom columns, at most {max} are supported",
        path = path.display()
    )]
    TooManySymptomColumns {
        path: PathBuf,
        found: usize,
        max: usize,
    },
    #[error("dataset contains no usable rows: {0}")]
    EmptyDataset(String),
    #[error("training failed: {0}")]
    Training(String),
    #[error("failed to create report directory: {0}")]
    ReportDirCreation(std::io::Error),
    #[error("failed to write report: {0}")]
    ReportWrite(std::io::Error),
    #[error("failed to render report: {0}")]
    ReportRender(String),
    #[error("failed to read report: {0}")]
    ReportRead(std::io::Error),
    #[error("invalid report id: {0}")]
    InvalidReportId(String),
}

pub type IntelResult<T> = std::result::Result<T, IntelError>;

/// Errors raised on the request path, one per user submission.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("{}", describe_unrecognised(.unrecognised))]
    NoRecognisedSymptoms { unrecognised: Vec<String> },
    #[error("symptom input exceeds maximum length of {max} characters")]
    InputTooLong { max: usize },
    #[error("classifier returned no class probabilities")]
    EmptyProbabilities,
    #[error("classifier predicted label {0}, which the label encoder does not know")]
    UnknownLabel(usize),
    #[error("failed to export report: {0}")]
    Report(#[from] IntelError),
}

impl PredictError {
    /// True when the failure was caused by what the user typed rather than the server.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PredictError::NoRecognisedSymptoms { .. } | PredictError::InputTooLong { .. }
        )
    }
}

fn describe_unrecognised(unrecognised: &[String]) -> String {
    if unrecognised.is_empty() {
        "no symptoms were entered".into()
    } else {
        format!(
            "none of the entered symptoms are recognised: {}",
            unrecognised.join(", ")
        )
    }
}
