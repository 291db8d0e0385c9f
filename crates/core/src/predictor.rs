//! One prediction end to end: diagnose the symptoms, then export the report.

use crate::context::InferenceContext;
use crate::error::PredictError;
use crate::forest::{Classifier, RandomForest};
use crate::report::{ExportedReport, ReportExporter};
use serde::Serialize;

/// The result of classifying one symptom submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    /// The submission as entered, trimmed.
    pub symptoms: String,
    pub disease: String,
    pub label: usize,
    /// Percentage in `[0, 100]`, rounded to two decimals.
    pub confidence: f64,
    pub description: String,
    pub precaution: String,
    pub recognised: Vec<String>,
    /// Tokens that were ignored because they are not in the vocabulary.
    pub unrecognised: Vec<String>,
}

impl Diagnosis {
    /// The confidence as shown to users, always with at least one decimal: `80.0%`, `91.25%`.
    pub fn confidence_text(&self) -> String {
        let value = self.confidence.to_string();
        if value.contains('.') {
            format!("{value}%")
        } else {
            format!("{value}.0%")
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prediction {
    pub diagnosis: Diagnosis,
    pub report: ExportedReport,
}

/// Borrows the shared context and exporter for the duration of a request.
pub struct Predictor<'a, C = RandomForest> {
    context: &'a InferenceContext<C>,
    exporter: &'a ReportExporter,
}

impl<'a, C: Classifier> Predictor<'a, C> {
    pub fn new(context: &'a InferenceContext<C>, exporter: &'a ReportExporter) -> Self {
        Self { context, exporter }
    }

    /// Diagnoses `input` and writes its report.
    ///
    /// # Errors
    ///
    /// Returns the validation error from [`InferenceContext::diagnose`], or
    /// `PredictError::Report` if the report cannot be written. No report is written for
    /// rejected input.
    pub fn predict(&self, input: &str) -> Result<Prediction, PredictError> {
        let diagnosis = self.context.diagnose(input)?;
        let report = self.exporter.export(&diagnosis)?;
        tracing::info!(
            "predicted {} ({}) for {} symptoms, report {}",
            diagnosis.disease,
            diagnosis.confidence_text(),
            diagnosis.recognised.len(),
            report.id
        );
        Ok(Prediction { diagnosis, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{LabelEncoder, SymptomVocabulary};
    use crate::knowledge::DiseaseKnowledge;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingClassifier {
        calls: AtomicUsize,
    }

    impl Classifier for CountingClassifier {
        fn predict_proba(&self, _features: &[f64]) -> Vec<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![0.1, 0.9]
        }

        fn n_classes(&self) -> usize {
            2
        }
    }

    fn context() -> InferenceContext<CountingClassifier> {
        InferenceContext::new(
            SymptomVocabulary::build(["fever", "cough"]),
            LabelEncoder::fit([("flu", "Flu"), ("malaria", "Malaria")]),
            DiseaseKnowledge::default(),
            CountingClassifier {
                calls: AtomicUsize::new(0),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_predict_writes_report() {
        let tmp = TempDir::new().unwrap();
        let exporter = ReportExporter::new(tmp.path()).unwrap();
        let ctx = context();

        let prediction = Predictor::new(&ctx, &exporter).predict("Fever").unwrap();
        assert_eq!(prediction.diagnosis.disease, "Malaria");
        assert_eq!(prediction.diagnosis.confidence, 90.0);
        assert_eq!(prediction.diagnosis.confidence_text(), "90.0%");
        assert!(prediction.report.path.exists());
        assert_eq!(ctx.classifier().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejected_input_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let exporter = ReportExporter::new(tmp.path()).unwrap();
        let ctx = context();

        let err = Predictor::new(&ctx, &exporter)
            .predict("sneezing")
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ctx.classifier().calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_confidence_text_keeps_fraction() {
        let mut diagnosis = Diagnosis {
            symptoms: "fever".into(),
            disease: "Flu".into(),
            label: 0,
            confidence: 91.25,
            description: String::new(),
            precaution: String::new(),
            recognised: vec!["fever".into()],
            unrecognised: vec![],
        };
        assert_eq!(diagnosis.confidence_text(), "91.25%");
        diagnosis.confidence = 100.0;
        assert_eq!(diagnosis.confidence_text(), "100.0%");
    }
}
