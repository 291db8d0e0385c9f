//! Downloadable PDF reports.
//!
//! Each prediction is written to its own file, `<report_dir>/<id>.pdf`, so concurrent requests
//! never overwrite each other's report. Files are written to a temporary file in the same
//! directory and then renamed into place; a reader sees either nothing or a complete report.
//!
//! Nothing removes reports on the request path. Long-running servers call
//! [`ReportExporter::prune_older_than`] at startup to bound the directory.

pub mod pdf;

use crate::constants::REPORT_EXTENSION;
use crate::predictor::Diagnosis;
use crate::report_id::ReportId;
use crate::{IntelError, IntelResult};
use pdf::{Align, PdfPage};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;

/// Points between the report title and its body.
const TITLE_GAP: f64 = pdf::MARGIN;

/// Line budgets per field. Together they always fit on one page.
const SYMPTOM_LINES: usize = 8;
const DISEASE_LINES: usize = 2;
const DESCRIPTION_LINES: usize = 16;
const PRECAUTION_LINES: usize = 8;

/// Where a report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub id: ReportId,
    pub path: PathBuf,
}

/// Writes and reads reports under one directory.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    dir: PathBuf,
}

impl ReportExporter {
    /// Uses `dir` for reports, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`IntelError::ReportDirCreation`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> IntelResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(IntelError::ReportDirCreation)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &ReportId) -> PathBuf {
        id.file_in(&self.dir, REPORT_EXTENSION)
    }

    /// Renders `diagnosis` and stores it under a fresh [`ReportId`].
    ///
    /// # Errors
    ///
    /// Returns [`IntelError::ReportWrite`] if the file cannot be written.
    pub fn export(&self, diagnosis: &Diagnosis) -> IntelResult<ExportedReport> {
        let id = ReportId::new();
        let path = self.path_for(&id);
        let bytes = render_report(diagnosis)?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(IntelError::ReportWrite)?;
        tmp.write_all(&bytes).map_err(IntelError::ReportWrite)?;
        tmp.as_file().sync_all().map_err(IntelError::ReportWrite)?;
        tmp.persist(&path)
            .map_err(|e| IntelError::ReportWrite(e.error))?;

        tracing::debug!("wrote report {} ({} bytes)", path.display(), bytes.len());
        Ok(ExportedReport { id, path })
    }

    /// Reads a previously exported report. `Ok(None)` if there is no such report.
    ///
    /// # Errors
    ///
    /// Returns [`IntelError::ReportRead`] for any I/O failure other than a missing file.
    pub fn open(&self, id: &ReportId) -> IntelResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IntelError::ReportRead(e)),
        }
    }

    /// Deletes reports last modified at least `max_age` ago and returns how many went.
    ///
    /// Only files named like an exported report are considered.
    ///
    /// # Errors
    ///
    /// Returns [`IntelError::ReportRead`] if the directory cannot be listed.
    pub fn prune_older_than(&self, max_age: Duration) -> IntelResult<usize> {
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in fs::read_dir(&self.dir).map_err(IntelError::ReportRead)? {
            let path = entry.map_err(IntelError::ReportRead)?.path();
            if !is_report_file(&path) {
                continue;
            }
            let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if now.duration_since(modified).unwrap_or_default() < max_age {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("failed to remove {}: {}", path.display(), e),
            }
        }

        if removed > 0 {
            tracing::info!("pruned {} reports from {}", removed, self.dir.display());
        }
        Ok(removed)
    }
}

fn is_report_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(REPORT_EXTENSION)
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| ReportId::parse(stem).is_ok())
}

/// Lays out the report page for `diagnosis`.
///
/// Every field is capped to a line budget, so overlong symptoms or descriptions end in an
/// ellipsis and never push the later fields off the page.
///
/// # Errors
///
/// Returns [`IntelError::ReportRender`] if the document cannot be serialised.
pub fn render_report(diagnosis: &Diagnosis) -> IntelResult<Vec<u8>> {
    PdfPage::new()
        .text("Disease Prediction Report", Align::Center, 1)
        .gap(TITLE_GAP)
        .text(
            format!("Symptoms: {}", diagnosis.symptoms),
            Align::Left,
            SYMPTOM_LINES,
        )
        .text(
            format!("Predicted Disease: {}", diagnosis.disease),
            Align::Left,
            DISEASE_LINES,
        )
        .text(
            format!("Confidence Score: {}", diagnosis.confidence_text()),
            Align::Left,
            1,
        )
        .text(
            format!("Disease Description: {}", diagnosis.description),
            Align::Left,
            DESCRIPTION_LINES,
        )
        .text(
            format!("Precaution: {}", diagnosis.precaution),
            Align::Left,
            PRECAUTION_LINES,
        )
        .render()
}
