//! Symptom and disease encoding.
//!
//! Two mappings are built from the training table:
//!
//! - [`SymptomVocabulary`]: symptom string → code, handed out in first-seen order (row by row,
//!   column by column) starting at [`SYMPTOM_CODE_OFFSET`].
//! - [`LabelEncoder`]: disease name ↔ dense class index, in sorted name order.
//!
//! A [`FeatureRow`] is always [`MAX_SYMPTOMS`] slots wide. Slots are typed so an empty
//! position and a symptom the vocabulary has never seen stay distinguishable, even though both
//! reach the classifier as [`PADDING_CODE`].

use crate::constants::{MAX_SYMPTOMS, PADDING_CODE, SYMPTOM_CODE_OFFSET};
use crate::dataset::{normalise, SymptomTable};
use crate::{IntelError, IntelResult};
use std::collections::{BTreeMap, HashMap};

/// Normalised symptom → unique code.
#[derive(Debug, Clone, Default)]
pub struct SymptomVocabulary {
    codes: HashMap<String, u32>,
    symptoms: Vec<String>,
}

impl SymptomVocabulary {
    /// Assigns codes to `symptoms` in the order they are first seen. Empty strings are ignored.
    pub fn build<'a>(symptoms: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vocabulary = Self::default();
        for symptom in symptoms {
            if symptom.is_empty() || vocabulary.codes.contains_key(symptom) {
                continue;
            }
            let code = SYMPTOM_CODE_OFFSET + vocabulary.symptoms.len() as u32;
            vocabulary.codes.insert(symptom.to_string(), code);
            vocabulary.symptoms.push(symptom.to_string());
        }
        vocabulary
    }

    /// Builds the vocabulary from every symptom cell of `table`, row-major.
    pub fn from_table(table: &SymptomTable) -> Self {
        Self::build(
            table
                .cases()
                .iter()
                .flat_map(|case| case.symptoms.iter().flatten().map(String::as_str)),
        )
    }

    /// Code of an already normalised symptom.
    pub fn code(&self, symptom: &str) -> Option<u32> {
        self.codes.get(symptom).copied()
    }

    pub fn symptom(&self, code: u32) -> Option<&str> {
        let index = code.checked_sub(SYMPTOM_CODE_OFFSET)? as usize;
        self.symptoms.get(index).map(String::as_str)
    }

    /// `(code, symptom)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.symptoms
            .iter()
            .enumerate()
            .map(|(i, s)| (SYMPTOM_CODE_OFFSET + i as u32, s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }
}

/// Disease name ↔ dense class index.
///
/// Indices follow the sorted order of the normalised names, so the encoding does not depend on
/// row order. The first spelling seen in the source is kept for display.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    classes: Vec<String>,
    display: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Fits the encoder over `(normalised, display)` pairs.
    pub fn fit<'a>(diseases: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for (name, display) in diseases {
            seen.entry(name).or_insert(display);
        }

        let classes: Vec<String> = seen.keys().map(|k| k.to_string()).collect();
        let display = seen.values().map(|v| v.to_string()).collect();
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Self {
            classes,
            display,
            index,
        }
    }

    pub fn from_table(table: &SymptomTable) -> Self {
        Self::fit(
            table
                .cases()
                .iter()
                .map(|case| (case.disease.as_str(), case.display_disease.as_str())),
        )
    }

    /// Class index of `disease`. The name is normalised before lookup.
    pub fn encode(&self, disease: &str) -> Option<usize> {
        self.index.get(&normalise(disease)).copied()
    }

    /// Normalised disease name of class `label`.
    pub fn decode(&self, label: usize) -> Option<&str> {
        self.classes.get(label).map(String::as_str)
    }

    /// Source spelling of class `label`.
    pub fn display_name(&self, label: usize) -> Option<&str> {
        self.display.get(label).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

/// One position of a feature row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// No symptom in this position.
    Padding,
    /// A symptom present in the vocabulary.
    Known(u32),
    /// A symptom the vocabulary has never seen.
    Unrecognised(String),
}

impl Slot {
    /// The value the classifier sees for this slot.
    pub fn code(&self) -> u32 {
        match self {
            Slot::Known(code) => *code,
            Slot::Padding | Slot::Unrecognised(_) => PADDING_CODE,
        }
    }
}

/// Fixed-width encoding of one case's symptoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    slots: Vec<Slot>,
}

impl FeatureRow {
    /// Encodes comma-separated free text. Never fails: empty input gives an all-padding row.
    ///
    /// Tokens go through the same [`normalise`] as the training cells, so besides lowercasing
    /// and trimming, `_` also becomes a space: `skin_rash` matches the vocabulary's
    /// `skin rash`. Tokens beyond [`MAX_SYMPTOMS`] are dropped.
    pub fn encode(input: &str, vocabulary: &SymptomVocabulary) -> Self {
        let tokens = input.split(',').map(normalise).take(MAX_SYMPTOMS);
        Self::from_tokens(tokens, vocabulary)
    }

    /// Encodes the symptom cells of a training row, keeping column positions.
    pub fn from_cells(cells: &[Option<String>], vocabulary: &SymptomVocabulary) -> Self {
        let tokens = cells
            .iter()
            .take(MAX_SYMPTOMS)
            .map(|cell| cell.clone().unwrap_or_default());
        Self::from_tokens(tokens, vocabulary)
    }

    fn from_tokens(tokens: impl Iterator<Item = String>, vocabulary: &SymptomVocabulary) -> Self {
        let mut slots: Vec<Slot> = tokens
            .map(|token| {
                if token.is_empty() {
                    Slot::Padding
                } else if let Some(code) = vocabulary.code(&token) {
                    Slot::Known(code)
                } else {
                    Slot::Unrecognised(token)
                }
            })
            .collect();
        slots.resize(MAX_SYMPTOMS, Slot::Padding);
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn codes(&self) -> Vec<u32> {
        self.slots.iter().map(Slot::code).collect()
    }

    /// Numeric features in column order.
    pub fn features(&self) -> Vec<f64> {
        self.slots.iter().map(|s| f64::from(s.code())).collect()
    }

    /// Symptoms found in the vocabulary, in input order.
    pub fn recognised<'v>(&self, vocabulary: &'v SymptomVocabulary) -> Vec<&'v str> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Known(code) => vocabulary.symptom(*code),
                _ => None,
            })
            .collect()
    }

    /// Tokens the vocabulary does not know, in input order.
    pub fn unrecognised(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Unrecognised(token) => Some(token.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn recognised_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Known(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The training table in numeric form.
#[derive(Debug, Clone, Default)]
pub struct EncodedCases {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

impl EncodedCases {
    /// Encodes every case of `table` with the given mappings.
    ///
    /// # Errors
    ///
    /// Returns `IntelError::InvalidInput` if a disease is missing from `labels`, which means the
    /// encoder was fitted on a different table.
    pub fn encode(
        table: &SymptomTable,
        vocabulary: &SymptomVocabulary,
        labels: &LabelEncoder,
    ) -> IntelResult<Self> {
        let mut encoded = Self::default();
        for case in table.cases() {
            let label = labels.encode(&case.disease).ok_or_else(|| {
                IntelError::InvalidInput(format!(
                    "disease '{}' is not known to the label encoder",
                    case.disease
                ))
            })?;
            encoded
                .features
                .push(FeatureRow::from_cells(&case.symptoms, vocabulary).features());
            encoded.labels.push(label);
        }
        Ok(encoded)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CaseRecord;
    use std::collections::HashSet;

    fn case(disease: &str, symptoms: &[&str]) -> CaseRecord {
        CaseRecord {
            disease: normalise(disease),
            display_disease: disease.to_string(),
            symptoms: symptoms
                .iter()
                .map(|s| Some(s.to_string()).filter(|s| !s.is_empty()))
                .collect(),
        }
    }

    fn table() -> SymptomTable {
        SymptomTable::new(
            vec!["Symptom_1".into(), "Symptom_2".into(), "Symptom_3".into()],
            vec![
                case("Flu", &["cough", "fever", "headache"]),
                case("Common Cold", &["cough", "runny nose", ""]),
                case("Flu", &["fever", "chills", ""]),
            ],
        )
    }

    #[test]
    fn test_vocabulary_first_seen_order_from_offset() {
        let vocab = SymptomVocabulary::from_table(&table());
        assert_eq!(vocab.code("cough"), Some(101));
        assert_eq!(vocab.code("fever"), Some(102));
        assert_eq!(vocab.code("headache"), Some(103));
        assert_eq!(vocab.code("runny nose"), Some(104));
        assert_eq!(vocab.code("chills"), Some(105));
        assert_eq!(vocab.len(), 5);
    }

    #[test]
    fn test_vocabulary_is_stable_and_injective() {
        let vocab = SymptomVocabulary::from_table(&table());
        let codes: HashSet<u32> = vocab.iter().map(|(code, _)| code).collect();
        assert_eq!(codes.len(), vocab.len());
        for (code, symptom) in vocab.iter() {
            assert_eq!(vocab.code(symptom), Some(code));
            assert_eq!(vocab.code(symptom), vocab.code(symptom));
            assert_eq!(vocab.symptom(code), Some(symptom));
        }
        assert_eq!(vocab.symptom(0), None);
        assert_eq!(vocab.symptom(100), None);
    }

    #[test]
    fn test_label_encoder_sorted_and_round_trips() {
        let labels = LabelEncoder::from_table(&table());
        assert_eq!(labels.classes(), &["common cold", "flu"]);
        for disease in labels.classes() {
            let label = labels.encode(disease).unwrap();
            assert_eq!(labels.decode(label), Some(disease.as_str()));
        }
        assert_eq!(labels.display_name(0), Some("Common Cold"));
        assert_eq!(labels.encode("Malaria"), None);
    }

    #[test]
    fn test_feature_row_pads_to_fixed_width() {
        let vocab = SymptomVocabulary::build(["cough", "fever", "headache"]);
        let row = FeatureRow::encode("cough, fever, headache", &vocab);

        let mut expected = vec![101, 102, 103];
        expected.extend(std::iter::repeat(0).take(14));
        assert_eq!(row.codes(), expected);
        assert_eq!(row.len(), MAX_SYMPTOMS);
    }

    #[test]
    fn test_feature_row_truncates_long_input() {
        let vocab = SymptomVocabulary::build(["cough"]);
        let input = vec!["cough"; 30].join(",");
        let row = FeatureRow::encode(&input, &vocab);
        assert_eq!(row.len(), MAX_SYMPTOMS);
        assert!(row.codes().iter().all(|&c| c == 101));
    }

    #[test]
    fn test_feature_row_empty_input_is_all_padding() {
        let vocab = SymptomVocabulary::build(["cough"]);
        let row = FeatureRow::encode("", &vocab);
        assert_eq!(row.len(), MAX_SYMPTOMS);
        assert!(row.slots().iter().all(|s| *s == Slot::Padding));
        assert!(row.codes().iter().all(|&c| c == PADDING_CODE));
        assert_eq!(row.recognised_count(), 0);
    }

    #[test]
    fn test_feature_row_accepts_underscored_input() {
        let vocab = SymptomVocabulary::build(["skin rash"]);
        let row = FeatureRow::encode(" Skin_Rash ", &vocab);
        assert_eq!(row.slots()[0], Slot::Known(101));
    }

    #[test]
    fn test_feature_row_distinguishes_unrecognised_from_padding() {
        let vocab = SymptomVocabulary::build(["cough"]);
        let row = FeatureRow::encode("Cough, purple spots", &vocab);

        assert_eq!(row.slots()[0], Slot::Known(101));
        assert_eq!(row.slots()[1], Slot::Unrecognised("purple spots".into()));
        assert_eq!(row.slots()[2], Slot::Padding);
        assert_eq!(row.codes()[1], PADDING_CODE);
        assert_eq!(row.unrecognised(), vec!["purple spots"]);
        assert_eq!(row.recognised(&vocab), vec!["cough"]);
    }

    #[test]
    fn test_encoded_cases_match_table() {
        let table = table();
        let vocab = SymptomVocabulary::from_table(&table);
        let labels = LabelEncoder::from_table(&table);
        let encoded = EncodedCases::encode(&table, &vocab, &labels).unwrap();

        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded.labels, vec![1, 0, 1]);
        assert_eq!(&encoded.features[1][..3], &[101.0, 104.0, 0.0]);
        assert!(encoded.features.iter().all(|f| f.len() == MAX_SYMPTOMS));
    }
}
