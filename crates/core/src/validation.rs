//! Input validation for symptom submissions.
//!
//! Free text from the web form or CLI is checked before any prediction is made: an
//! over-long submission is refused outright, and a submission in which no symptom matches the
//! vocabulary is refused with the list of tokens that did not match.

use crate::encoding::FeatureRow;
use crate::error::PredictError;

/// Longest symptom submission accepted, in characters.
pub const MAX_INPUT_LEN: usize = 2_000;

/// Rejects submissions longer than [`MAX_INPUT_LEN`] characters.
///
/// # Errors
///
/// Returns [`PredictError::InputTooLong`].
pub fn validate_input_length(input: &str) -> Result<(), PredictError> {
    if input.chars().count() > MAX_INPUT_LEN {
        return Err(PredictError::InputTooLong { max: MAX_INPUT_LEN });
    }
    Ok(())
}

/// Requires at least one recognised symptom in `row`.
///
/// # Errors
///
/// Returns [`PredictError::NoRecognisedSymptoms`] carrying the unrecognised tokens (empty when
/// nothing was entered at all).
pub fn validate_feature_row(row: &FeatureRow) -> Result<(), PredictError> {
    if row.recognised_count() == 0 {
        return Err(PredictError::NoRecognisedSymptoms {
            unrecognised: row.unrecognised().into_iter().map(String::from).collect(),
        });
    }
    Ok(())
}
