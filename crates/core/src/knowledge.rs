//! Read-only disease descriptions and precautions.

use crate::constants::{NO_DESCRIPTION, NO_PRECAUTION};
use crate::dataset::normalise;
use std::collections::HashMap;

/// Free-text facts about each disease, keyed by normalised disease name.
#[derive(Debug, Clone, Default)]
pub struct DiseaseKnowledge {
    descriptions: HashMap<String, String>,
    precautions: HashMap<String, String>,
}

impl DiseaseKnowledge {
    pub fn new(
        descriptions: HashMap<String, String>,
        precautions: HashMap<String, String>,
    ) -> Self {
        Self {
            descriptions,
            precautions,
        }
    }

    /// Description of `disease` (case-insensitive), or [`NO_DESCRIPTION`].
    pub fn description(&self, disease: &str) -> &str {
        self.descriptions
            .get(&normalise(disease))
            .map(String::as_str)
            .unwrap_or(NO_DESCRIPTION)
    }

    /// Comma-joined precautions for `disease` (case-insensitive), or [`NO_PRECAUTION`].
    pub fn precaution(&self, disease: &str) -> &str {
        self.precautions
            .get(&normalise(disease))
            .map(String::as_str)
            .unwrap_or(NO_PRECAUTION)
    }

    pub fn description_count(&self) -> usize {
        self.descriptions.len()
    }

    pub fn precaution_count(&self) -> usize {
        self.precautions.len()
    }
}
