//! Dataset manifest
//!
//! A `metadata.json` next to the generated files that records, for every
//! successful item, which file holds it and the parameters it was built
//! from.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::batch::{BatchError, BatchReport};
use crate::constants::MANIFEST_FILE_NAME;
use crate::params::FlangeParams;

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub entries: Vec<ManifestEntry>,
}

/// One generated model
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    /// Position of the item in the batch
    pub id: usize,
    pub name: String,
    /// File name relative to the manifest
    pub file: String,
    pub parameters: FlangeParams,
}

impl Manifest {
    pub fn from_report(report: &BatchReport, generated_at: DateTime<Utc>) -> Self {
        let entries = report
            .results
            .iter()
            .filter_map(|result| {
                let path = result.outcome.as_ref().ok()?;
                let parameters = result.params?;
                let file = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                Some(ManifestEntry {
                    id: result.index,
                    name: result.name.clone(),
                    file,
                    parameters,
                })
            })
            .collect();

        Self {
            generated_at,
            total: report.total(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            entries,
        }
    }
}

/// Write `metadata.json` for a batch into `dir`
pub fn write_manifest(dir: &Path, report: &BatchReport) -> Result<PathBuf, BatchError> {
    let manifest = Manifest::from_report(report, Utc::now());
    let json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| BatchError::Manifest(e.to_string()))?;

    let path = dir.join(MANIFEST_FILE_NAME);
    std::fs::write(&path, json).map_err(|e| BatchError::Manifest(e.to_string()))?;

    tracing::info!(path = %path.display(), entries = manifest.entries.len(), "manifest written");
    Ok(path)
}
