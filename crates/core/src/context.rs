//! The immutable bundle every prediction reads from.
//!
//! [`InferenceContext::train`] runs the whole startup pipeline (encode, split, grid search,
//! refit, evaluate) and returns a value that is never mutated again. The web layer shares it
//! behind an `Arc`; tests build one by hand around a stub [`Classifier`].

use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::encoding::{EncodedCases, FeatureRow, LabelEncoder, SymptomVocabulary};
use crate::error::PredictError;
use crate::forest::tree::argmax;
use crate::forest::{train_test_split, Classifier, ForestParams, GridSearch, RandomForest};
use crate::knowledge::DiseaseKnowledge;
use crate::metrics::ClassificationReport;
use crate::predictor::Diagnosis;
use crate::validation::{validate_feature_row, validate_input_length};
use crate::{IntelError, IntelResult};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the startup pipeline found.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub best_params: ForestParams,
    /// Mean cross-validation accuracy of the best candidate.
    pub cv_accuracy: f64,
    pub candidates_evaluated: usize,
    /// Metrics on the held-out split.
    pub test_report: ClassificationReport,
    pub n_train: usize,
    pub n_test: usize,
    pub vocabulary_size: usize,
    pub n_classes: usize,
    pub trained_at: DateTime<Utc>,
}

/// Vocabulary, label encoder, disease facts and the fitted classifier.
#[derive(Debug)]
pub struct InferenceContext<C = RandomForest> {
    vocabulary: SymptomVocabulary,
    labels: LabelEncoder,
    knowledge: DiseaseKnowledge,
    classifier: C,
    summary: Option<TrainingSummary>,
}

impl<C: Classifier> InferenceContext<C> {
    /// Assembles a context from its parts.
    ///
    /// # Errors
    ///
    /// Returns `IntelError::InvalidInput` if the classifier and label encoder disagree on the
    /// number of classes.
    pub fn new(
        vocabulary: SymptomVocabulary,
        labels: LabelEncoder,
        knowledge: DiseaseKnowledge,
        classifier: C,
    ) -> IntelResult<Self> {
        if classifier.n_classes() != labels.n_classes() {
            return Err(IntelError::InvalidInput(format!(
                "classifier has {} classes but the label encoder has {}",
                classifier.n_classes(),
                labels.n_classes()
            )));
        }
        Ok(Self {
            vocabulary,
            labels,
            knowledge,
            classifier,
            summary: None,
        })
    }

    pub fn with_summary(mut self, summary: TrainingSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn vocabulary(&self) -> &SymptomVocabulary {
        &self.vocabulary
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    pub fn knowledge(&self) -> &DiseaseKnowledge {
        &self.knowledge
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn summary(&self) -> Option<&TrainingSummary> {
        self.summary.as_ref()
    }

    /// Encodes free text without validating it.
    pub fn encode(&self, input: &str) -> FeatureRow {
        FeatureRow::encode(input, &self.vocabulary)
    }

    /// Validates `input`, runs the classifier once and looks up the disease facts.
    ///
    /// # Errors
    ///
    /// Returns a validation `PredictError` for empty, over-long or entirely unrecognised input,
    /// and `EmptyProbabilities`/`UnknownLabel` if the classifier misbehaves.
    pub fn diagnose(&self, input: &str) -> Result<Diagnosis, PredictError> {
        validate_input_length(input)?;
        let row = self.encode(input);
        validate_feature_row(&row)?;

        let unrecognised: Vec<String> = row.unrecognised().into_iter().map(String::from).collect();
        if !unrecognised.is_empty() {
            tracing::warn!("ignoring unrecognised symptoms: {}", unrecognised.join(", "));
        }

        let proba = self.classifier.predict_proba(&row.features());
        if proba.is_empty() {
            return Err(PredictError::EmptyProbabilities);
        }
        let label = argmax(&proba);
        let disease = self
            .labels
            .display_name(label)
            .ok_or(PredictError::UnknownLabel(label))?;

        Ok(Diagnosis {
            symptoms: input.trim().to_string(),
            disease: disease.to_string(),
            label,
            confidence: confidence_percent(proba[label]),
            description: self.knowledge.description(disease).to_string(),
            precaution: self.knowledge.precaution(disease).to_string(),
            recognised: row
                .recognised(&self.vocabulary)
                .into_iter()
                .map(String::from)
                .collect(),
            unrecognised,
        })
    }
}

impl InferenceContext<RandomForest> {
    /// Runs the startup pipeline over `dataset`.
    ///
    /// # Errors
    ///
    /// Returns `IntelError` if the data cannot be split or folded, or a fit fails. Nothing is
    /// retried; a failure here is fatal to startup.
    pub fn train(dataset: Dataset, config: &TrainingConfig) -> IntelResult<Self> {
        let Dataset { table, knowledge } = dataset;

        let vocabulary = SymptomVocabulary::from_table(&table);
        let labels = LabelEncoder::from_table(&table);
        let encoded = EncodedCases::encode(&table, &vocabulary, &labels)?;
        tracing::info!(
            "encoded {} cases: {} distinct symptoms, {} diseases",
            encoded.len(),
            vocabulary.len(),
            labels.n_classes()
        );

        let split = train_test_split(encoded.len(), config.test_ratio, config.seed)?;
        let train_x: Vec<Vec<f64>> = split
            .train
            .iter()
            .map(|&i| encoded.features[i].clone())
            .collect();
        let train_y: Vec<usize> = split.train.iter().map(|&i| encoded.labels[i]).collect();

        let search = GridSearch::new(config.grid.clone(), config.folds, config.seed).run(
            &train_x,
            &train_y,
            labels.n_classes(),
        )?;

        let forest = RandomForest::fit(&train_x, &train_y, labels.n_classes(), search.best)?;
        tracing::info!(
            "refit forest: {} trees, {} nodes, average depth {:.1}",
            forest.n_trees(),
            forest.total_nodes(),
            forest.avg_depth()
        );

        let truth: Vec<usize> = split.test.iter().map(|&i| encoded.labels[i]).collect();
        let predicted: Vec<usize> = split
            .test
            .iter()
            .map(|&i| forest.predict(&encoded.features[i]))
            .collect();
        let names: Vec<String> = (0..labels.n_classes())
            .map(|l| labels.display_name(l).unwrap_or_default().to_string())
            .collect();
        let test_report = ClassificationReport::compute(&truth, &predicted, &names);
        tracing::info!(
            "held-out accuracy {:.4} on {} cases",
            test_report.accuracy,
            truth.len()
        );

        let summary = TrainingSummary {
            best_params: search.best,
            cv_accuracy: search.best_score,
            candidates_evaluated: search.candidates.len(),
            test_report,
            n_train: split.train.len(),
            n_test: split.test.len(),
            vocabulary_size: vocabulary.len(),
            n_classes: labels.n_classes(),
            trained_at: Utc::now(),
        };

        Ok(Self::new(vocabulary, labels, knowledge, forest)?.with_summary(summary))
    }
}

/// Probability as a percentage rounded to two decimals, clamped to `[0, 100]`.
pub fn confidence_percent(probability: f64) -> f64 {
    let percent = probability.clamp(0.0, 1.0) * 100.0;
    (percent * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CaseRecord, SymptomTable};
    use crate::forest::ParamGrid;
    use crate::knowledge::DiseaseKnowledge;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Always predicts `class` with `probability`, spreading the rest over the other classes.
    struct StubClassifier {
        n_classes: usize,
        class: usize,
        probability: f64,
        calls: Mutex<Vec<Vec<f64>>>,
    }

    impl StubClassifier {
        fn new(n_classes: usize, class: usize, probability: f64) -> Self {
            Self {
                n_classes,
                class,
                probability,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Classifier for StubClassifier {
        fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
            self.calls.lock().unwrap().push(features.to_vec());
            let rest = (1.0 - self.probability) / (self.n_classes - 1) as f64;
            (0..self.n_classes)
                .map(|c| if c == self.class { self.probability } else { rest })
                .collect()
        }

        fn n_classes(&self) -> usize {
            self.n_classes
        }
    }

    fn stub_context(probability: f64) -> InferenceContext<StubClassifier> {
        let vocabulary = SymptomVocabulary::build(["cough", "fever", "headache"]);
        let labels = LabelEncoder::fit([
            ("allergy", "Allergy"),
            ("common cold", "Common Cold"),
            ("flu", "Flu"),
            ("migraine", "Migraine"),
        ]);
        let knowledge = DiseaseKnowledge::new(
            HashMap::from([("migraine".to_string(), "A severe headache.".to_string())]),
            HashMap::new(),
        );
        InferenceContext::new(
            vocabulary,
            labels,
            knowledge,
            StubClassifier::new(4, 3, probability),
        )
        .unwrap()
    }

    #[test]
    fn test_diagnose_with_stub_classifier() {
        let ctx = stub_context(0.8);
        let diagnosis = ctx.diagnose("cough, fever, headache").unwrap();

        let calls = ctx.classifier().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let mut expected = vec![101.0, 102.0, 103.0];
        expected.extend(std::iter::repeat(0.0).take(14));
        assert_eq!(calls[0], expected);

        assert_eq!(diagnosis.label, 3);
        assert_eq!(diagnosis.disease, "Migraine");
        assert_eq!(diagnosis.confidence, 80.0);
        assert_eq!(diagnosis.description, "A severe headache.");
        assert_eq!(diagnosis.precaution, crate::constants::NO_PRECAUTION);
        assert_eq!(diagnosis.recognised, vec!["cough", "fever", "headache"]);
        assert!(diagnosis.unrecognised.is_empty());
    }

    #[test]
    fn test_diagnose_empty_input_is_typed_failure() {
        let ctx = stub_context(0.8);
        let err = ctx.diagnose("").unwrap_err();
        assert!(matches!(err, PredictError::NoRecognisedSymptoms { ref unrecognised } if unrecognised.is_empty()));
        assert!(err.is_validation());
        assert!(ctx.classifier().calls.lock().unwrap().is_empty());

        let row = ctx.encode("");
        assert!(row.codes().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_diagnose_flags_unrecognised_tokens() {
        let ctx = stub_context(0.5);
        let diagnosis = ctx.diagnose("cough, purple spots").unwrap();
        assert_eq!(diagnosis.unrecognised, vec!["purple spots"]);
        assert_eq!(diagnosis.recognised, vec!["cough"]);
    }

    #[test]
    fn test_context_rejects_class_count_mismatch() {
        let result = InferenceContext::new(
            SymptomVocabulary::default(),
            LabelEncoder::fit([("flu", "Flu")]),
            DiseaseKnowledge::default(),
            StubClassifier::new(4, 0, 1.0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_confidence_percent_bounds_and_rounding() {
        assert_eq!(confidence_percent(0.8), 80.0);
        assert_eq!(confidence_percent(0.123456), 12.35);
        assert_eq!(confidence_percent(1.5), 100.0);
        assert_eq!(confidence_percent(-0.1), 0.0);
    }

    fn case(disease: &str, symptoms: &[&str]) -> CaseRecord {
        CaseRecord {
            disease: disease.to_lowercase(),
            display_disease: disease.to_string(),
            symptoms: symptoms.iter().map(|s| Some(s.to_string())).collect(),
        }
    }

    #[test]
    fn test_train_end_to_end_on_small_table() {
        let mut cases = Vec::new();
        for _ in 0..10 {
            cases.push(case("Flu", &["fever", "chills", "muscle pain"]));
            cases.push(case("Common Cold", &["runny nose", "sneezing", "cough"]));
            cases.push(case("Migraine", &["headache", "nausea", "blurred vision"]));
        }
        let table = SymptomTable::new(
            vec!["Symptom_1".into(), "Symptom_2".into(), "Symptom_3".into()],
            cases,
        );
        let dataset = Dataset {
            table,
            knowledge: DiseaseKnowledge::default(),
        };
        let config = TrainingConfig {
            grid: ParamGrid {
                n_estimators: vec![5],
                max_depth: vec![None],
                min_samples_split: vec![2],
                min_samples_leaf: vec![1],
                bootstrap: vec![true, false],
            },
            ..TrainingConfig::default()
        };

        let ctx = InferenceContext::train(dataset, &config).unwrap();
        let summary = ctx.summary().unwrap();
        assert_eq!(summary.n_train + summary.n_test, 30);
        assert_eq!(summary.n_test, 6);
        assert_eq!(summary.candidates_evaluated, 2);
        assert_eq!(summary.n_classes, 3);
        assert_eq!(summary.vocabulary_size, 9);

        let diagnosis = ctx.diagnose("headache, nausea, blurred vision").unwrap();
        assert_eq!(diagnosis.disease, "Migraine");
        assert!((0.0..=100.0).contains(&diagnosis.confidence));
    }
}
