//! Canonical report identifiers.
//!
//! Every exported report gets a fresh identifier: **32 lowercase hexadecimal characters**, no
//! hyphens (the simple form of a v4 UUID). Identifiers coming back from a download URL must
//! already be canonical; nothing else is accepted, which keeps them safe to use as filenames.

use crate::{IntelError, IntelResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// A report identifier guaranteed to be in canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReportId(Uuid);

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportId {
    /// Generates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates an identifier supplied from outside (for example a download URL).
    ///
    /// Uppercase or hyphenated forms are rejected rather than normalised.
    ///
    /// # Errors
    ///
    /// Returns [`IntelError::InvalidReportId`] if `input` is not canonical.
    pub fn parse(input: &str) -> IntelResult<Self> {
        if !Self::is_canonical(input) {
            return Err(IntelError::InvalidReportId(format!(
                "expected 32 lowercase hex characters, got '{input}'"
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| IntelError::InvalidReportId(e.to_string()))
    }

    /// Returns true if `input` is exactly 32 characters of `0-9a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// `dir/<id>.<extension>`
    pub fn file_in(&self, dir: &Path, extension: &str) -> PathBuf {
        dir.join(format!("{}.{extension}", self.0.simple()))
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ReportId {
    type Err = IntelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportId::parse(s)
    }
}
