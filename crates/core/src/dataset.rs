//! Loading of the three input tables.
//!
//! The training matrix has one `Disease` column and up to [`MAX_SYMPTOMS`] symptom columns.
//! Cells are normalised on the way in (see [`normalise`]) and empty cells are kept as absent
//! values so column positions survive into the feature rows.
//!
//! ```text
//! data/
//! ├── dataset.csv                # Disease,Symptom_1,...,Symptom_17
//! ├── symptom_Description.csv    # Disease,Description
//! └── symptom_precaution.csv     # Disease,Precaution_1,...,Precaution_4
//! ```

use crate::constants::{
    DATASET_FILENAME, DESCRIPTION_FILENAME, DISEASE_COLUMN, MAX_SYMPTOMS, PRECAUTION_FILENAME,
};
use crate::knowledge::DiseaseKnowledge;
use crate::{IntelError, IntelResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Lowercases, trims and replaces underscores with spaces.
///
/// Applied to every symptom cell, every disease name and every token of user input so that
/// `" Skin_Rash"` and `"skin rash"` meet in the same vocabulary entry.
pub fn normalise(raw: &str) -> String {
    raw.to_lowercase().trim().replace('_', " ")
}

/// One row of the training matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    /// Normalised disease name.
    pub disease: String,
    /// Disease name as written in the source, trimmed.
    pub display_disease: String,
    /// Normalised symptom per column, `None` where the cell was empty.
    pub symptoms: Vec<Option<String>>,
}

/// The parsed symptom/disease matrix.
#[derive(Debug, Clone, Default)]
pub struct SymptomTable {
    symptom_columns: Vec<String>,
    cases: Vec<CaseRecord>,
}

impl SymptomTable {
    /// Builds a table from already normalised records.
    pub fn new(symptom_columns: Vec<String>, cases: Vec<CaseRecord>) -> Self {
        Self {
            symptom_columns,
            cases,
        }
    }

    /// Parses the training matrix from `reader`. `source` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns an `IntelError` if the CSV is malformed, the `Disease` column is missing,
    /// there are more than [`MAX_SYMPTOMS`] symptom columns, or no row names a disease.
    pub fn from_reader(reader: impl Read, source: &Path) -> IntelResult<Self> {
        let mut rdr = csv_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| csv_error(source, e))?
            .clone();

        let disease_idx = column_index(&headers, DISEASE_COLUMN).ok_or_else(|| {
            IntelError::MissingColumn {
                path: source.to_path_buf(),
                column: DISEASE_COLUMN.into(),
            }
        })?;

        let symptom_idx: Vec<usize> = (0..headers.len()).filter(|&i| i != disease_idx).collect();
        if symptom_idx.len() > MAX_SYMPTOMS {
            return Err(IntelError::TooManySymptomColumns {
                path: source.to_path_buf(),
                found: symptom_idx.len(),
                max: MAX_SYMPTOMS,
            });
        }
        let symptom_columns = symptom_idx
            .iter()
            .map(|&i| headers[i].trim().to_string())
            .collect();

        let mut cases = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| csv_error(source, e))?;
            let raw_disease = record.get(disease_idx).unwrap_or("").trim();
            if raw_disease.is_empty() {
                tracing::warn!("skipping row {} of {}: no disease", row + 1, source.display());
                continue;
            }

            let symptoms = symptom_idx
                .iter()
                .map(|&i| {
                    record
                        .get(i)
                        .map(normalise)
                        .filter(|symptom| !symptom.is_empty())
                })
                .collect();

            cases.push(CaseRecord {
                disease: normalise(raw_disease),
                display_disease: raw_disease.to_string(),
                symptoms,
            });
        }

        if cases.is_empty() {
            return Err(IntelError::EmptyDataset(format!(
                "{} has no rows with a disease",
                source.display()
            )));
        }

        Ok(Self {
            symptom_columns,
            cases,
        })
    }

    /// Symptom column headers, in schema order.
    pub fn symptom_columns(&self) -> &[String] {
        &self.symptom_columns
    }

    pub fn cases(&self) -> &[CaseRecord] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Parses `Disease,Description` into a map keyed by normalised disease name.
pub fn descriptions_from_reader(
    reader: impl Read,
    source: &Path,
) -> IntelResult<HashMap<String, String>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| csv_error(source, e))?
        .clone();
    let disease_idx = require_column(&headers, DISEASE_COLUMN, source)?;
    let description_idx = require_column(&headers, "Description", source)?;

    let mut descriptions = HashMap::new();
    for record in rdr.records() {
        let record = record.map_err(|e| csv_error(source, e))?;
        let disease = normalise(record.get(disease_idx).unwrap_or(""));
        let description = record.get(description_idx).unwrap_or("").trim();
        if disease.is_empty() || description.is_empty() {
            continue;
        }
        descriptions.insert(disease, description.to_string());
    }
    Ok(descriptions)
}

/// Parses `Disease,Precaution_1..Precaution_N` into a map keyed by normalised disease name.
///
/// The precaution cells of a row are joined with `", "`; empty cells are skipped.
pub fn precautions_from_reader(
    reader: impl Read,
    source: &Path,
) -> IntelResult<HashMap<String, String>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| csv_error(source, e))?
        .clone();
    let disease_idx = require_column(&headers, DISEASE_COLUMN, source)?;
    let precaution_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.trim().to_lowercase().starts_with("precaution"))
        .map(|(i, _)| i)
        .collect();
    if precaution_idx.is_empty() {
        return Err(IntelError::MissingColumn {
            path: source.to_path_buf(),
            column: "Precaution_1".into(),
        });
    }

    let mut precautions = HashMap::new();
    for record in rdr.records() {
        let record = record.map_err(|e| csv_error(source, e))?;
        let disease = normalise(record.get(disease_idx).unwrap_or(""));
        if disease.is_empty() {
            continue;
        }
        let joined = precaution_idx
            .iter()
            .filter_map(|&i| record.get(i).map(str::trim))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if !joined.is_empty() {
            precautions.insert(disease, joined);
        }
    }
    Ok(precautions)
}

/// All three tables, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub table: SymptomTable,
    pub knowledge: DiseaseKnowledge,
}

/// Loads `dataset.csv`, `symptom_Description.csv` and `symptom_precaution.csv` from `data_dir`.
///
/// # Errors
///
/// Returns an `IntelError` if any file is missing or malformed.
pub fn load_dataset(data_dir: &Path) -> IntelResult<Dataset> {
    let dataset_path = data_dir.join(DATASET_FILENAME);
    let table = SymptomTable::from_reader(open(&dataset_path)?, &dataset_path)?;

    let description_path = data_dir.join(DESCRIPTION_FILENAME);
    let descriptions = descriptions_from_reader(open(&description_path)?, &description_path)?;

    let precaution_path = data_dir.join(PRECAUTION_FILENAME);
    let precautions = precautions_from_reader(open(&precaution_path)?, &precaution_path)?;

    tracing::info!(
        "loaded {} cases, {} descriptions, {} precaution lists from {}",
        table.len(),
        descriptions.len(),
        precautions.len(),
        data_dir.display()
    );

    Ok(Dataset {
        table,
        knowledge: DiseaseKnowledge::new(descriptions, precautions),
    })
}

fn open(path: &Path) -> IntelResult<File> {
    File::open(path).map_err(|source| IntelError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader)
}

fn csv_error(source: &Path, e: csv::Error) -> IntelError {
    IntelError::Csv {
        path: source.to_path_buf(),
        source: e,
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn require_column(headers: &csv::StringRecord, name: &str, source: &Path) -> IntelResult<usize> {
    column_index(headers, name).ok_or_else(|| IntelError::MissingColumn {
        path: source.to_path_buf(),
        column: name.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MATRIX: &str = "\
Disease,Symptom_1,Symptom_2,Symptom_3
Fungal infection,itching, skin_rash,nodal_skin_eruptions
Fungal infection, skin_rash,itching,
Allergy,continuous_sneezing,shivering,
";

    #[test]
    fn test_normalise_lowercases_trims_and_replaces_underscores() {
        assert_eq!(normalise("  Skin_Rash "), "skin rash");
        assert_eq!(normalise("FEVER"), "fever");
        assert_eq!(normalise("   "), "");
    }

    #[test]
    fn test_symptom_table_parses_cells_and_keeps_positions() {
        let table = SymptomTable::from_reader(MATRIX.as_bytes(), Path::new("dataset.csv")).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.symptom_columns(),
            &["Symptom_1", "Symptom_2", "Symptom_3"]
        );

        let second = &table.cases()[1];
        assert_eq!(second.disease, "fungal infection");
        assert_eq!(second.display_disease, "Fungal infection");
        assert_eq!(
            second.symptoms,
            vec![Some("skin rash".into()), Some("itching".into()), None]
        );
    }

    #[test]
    fn test_symptom_table_tolerates_short_rows() {
        let csv = "Disease,Symptom_1,Symptom_2\nFlu,fever\n";
        let table = SymptomTable::from_reader(csv.as_bytes(), Path::new("dataset.csv")).unwrap();
        assert_eq!(table.cases()[0].symptoms, vec![Some("fever".into()), None]);
    }

    #[test]
    fn test_symptom_table_skips_rows_without_disease() {
        let csv = "Disease,Symptom_1\n,fever\nFlu,cough\n";
        let table = SymptomTable::from_reader(csv.as_bytes(), Path::new("dataset.csv")).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.cases()[0].disease, "flu");
    }

    #[test]
    fn test_symptom_table_missing_disease_column() {
        let csv = "Illness,Symptom_1\nFlu,fever\n";
        let result = SymptomTable::from_reader(csv.as_bytes(), Path::new("dataset.csv"));
        assert!(matches!(result, Err(IntelError::MissingColumn { .. })));
    }

    #[test]
    fn test_symptom_table_rejects_too_many_columns() {
        let header: Vec<String> = std::iter::once("Disease".to_string())
            .chain((1..=18).map(|i| format!("Symptom_{i}")))
            .collect();
        let csv = format!("{}\n", header.join(","));
        let result = SymptomTable::from_reader(csv.as_bytes(), Path::new("dataset.csv"));
        assert!(matches!(
            result,
            Err(IntelError::TooManySymptomColumns { found: 18, .. })
        ));
    }

    #[test]
    fn test_symptom_table_empty_is_error() {
        let csv = "Disease,Symptom_1\n";
        let result = SymptomTable::from_reader(csv.as_bytes(), Path::new("dataset.csv"));
        assert!(matches!(result, Err(IntelError::EmptyDataset(_))));
    }

    #[test]
    fn test_precautions_join_non_empty_cells() {
        let csv = "\
Disease,Precaution_1,Precaution_2,Precaution_3,Precaution_4
Allergy,apply calamine,cover area with bandage,,use ice to compress itching
";
        let precautions =
            precautions_from_reader(csv.as_bytes(), Path::new("symptom_precaution.csv")).unwrap();
        assert_eq!(
            precautions.get("allergy").map(String::as_str),
            Some("apply calamine, cover area with bandage, use ice to compress itching")
        );
    }

    #[test]
    fn test_descriptions_keyed_by_normalised_disease() {
        let csv = "Disease,Description\nDrug Reaction,An adverse drug reaction.\n";
        let descriptions =
            descriptions_from_reader(csv.as_bytes(), Path::new("symptom_Description.csv"))
                .unwrap();
        assert_eq!(
            descriptions.get("drug reaction").map(String::as_str),
            Some("An adverse drug reaction.")
        );
    }

    #[test]
    fn test_load_dataset_from_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DATASET_FILENAME), MATRIX).unwrap();
        fs::write(
            temp.path().join(DESCRIPTION_FILENAME),
            "Disease,Description\nAllergy,An immune response.\n",
        )
        .unwrap();
        fs::write(
            temp.path().join(PRECAUTION_FILENAME),
            "Disease,Precaution_1\nAllergy,avoid triggers\n",
        )
        .unwrap();

        let dataset = load_dataset(temp.path()).unwrap();
        assert_eq!(dataset.table.len(), 3);
        assert_eq!(dataset.knowledge.description("ALLERGY"), "An immune response.");
        assert_eq!(dataset.knowledge.precaution("allergy"), "avoid triggers");
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_dataset(temp.path());
        assert!(matches!(result, Err(IntelError::FileRead { .. })));
    }
}
