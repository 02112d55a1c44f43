//! Batch generation
//!
//! Every item is validated, built and exported on its own. A failing item is
//! recorded in the report and the loop moves on; only problems with the
//! output directory or the manifest abort the batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use flange_cad::CadKernel;

use crate::export::{ExportError, ExportOptions, export_flange, sanitize_filename};
use crate::geometry::{GeometryError, build_flange};
use crate::manifest::write_manifest;
use crate::params::{FlangeParams, FlangeSpec, OutputFormat, ValidationError};

/// Progress is logged every this many items
const PROGRESS_INTERVAL: usize = 10;

/// Why a single flange could not be produced
#[derive(Debug, Clone, thiserror::Error)]
pub enum FlangeError {
    #[error("Invalid parameters: {0}")]
    Validation(#[from] ValidationError),
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Errors that abort a whole batch
#[derive(Debug, Clone, thiserror::Error)]
pub enum BatchError {
    #[error("Cannot create output directory {}: {reason}", .path.display())]
    OutputDir { path: PathBuf, reason: String },
    #[error("Cannot write manifest: {0}")]
    Manifest(String),
}

/// One requested flange
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    /// Output name; `flange_{index:04}` when absent
    pub name: Option<String>,
    /// The record, or why it could not be read
    pub spec: Result<FlangeSpec, ValidationError>,
}

impl BatchItem {
    pub fn new(spec: FlangeSpec) -> Self {
        Self {
            name: None,
            spec: Ok(spec),
        }
    }

    pub fn named(name: impl Into<String>, spec: FlangeSpec) -> Self {
        Self {
            name: Some(name.into()),
            spec: Ok(spec),
        }
    }

    /// A record that could not be read; it fails validation when processed
    pub fn rejected(name: Option<String>, error: ValidationError) -> Self {
        Self {
            name,
            spec: Err(error),
        }
    }
}

impl Default for BatchItem {
    fn default() -> Self {
        Self::new(FlangeSpec::default())
    }
}

impl From<FlangeSpec> for BatchItem {
    fn from(spec: FlangeSpec) -> Self {
        Self::new(spec)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    /// Replaces every item's own output format when set
    pub format_override: Option<OutputFormat>,
    pub export: ExportOptions,
    /// Write `metadata.json` after the loop
    pub write_manifest: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            format_override: None,
            export: ExportOptions::default(),
            write_manifest: true,
        }
    }
}

/// Outcome of one batch item
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub index: usize,
    /// Resolved output name, unique within the batch
    pub name: String,
    /// `None` when the record could not be read
    pub spec: Option<FlangeSpec>,
    /// Present when validation passed
    pub params: Option<FlangeParams>,
    /// Path of the written file, or why there is none
    pub outcome: Result<PathBuf, FlangeError>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Results of a batch, in input order
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub results: Vec<BatchResult>,
    pub manifest_path: Option<PathBuf>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

/// Build one flange and export it to `dest_stem.<ext>`
///
/// The solid is released once the file is written or the export fails.
pub fn generate(
    kernel: &dyn CadKernel,
    params: &FlangeParams,
    dest_stem: &Path,
    options: &ExportOptions,
) -> Result<PathBuf, FlangeError> {
    let flange = build_flange(kernel, params)?;
    let path = export_flange(&flange, dest_stem, params.output_format(), options)?;
    Ok(path)
}

/// Output names for every item, in order
///
/// Explicit names are sanitized. A name already taken gets the item index
/// appended.
fn assign_names(items: &[BatchItem]) -> Vec<String> {
    let mut taken = HashSet::new();
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let base = match &item.name {
                Some(name) => sanitize_filename(name),
                None => format!("flange_{index:04}"),
            };
            let mut name = base.clone();
            let mut attempt = 0;
            while !taken.insert(name.clone()) {
                name = if attempt == 0 {
                    format!("{base}_{index:04}")
                } else {
                    format!("{base}_{index:04}_{attempt}")
                };
                attempt += 1;
            }
            name
        })
        .collect()
}

fn process_item(
    kernel: &dyn CadKernel,
    item: &BatchItem,
    dest_stem: &Path,
    options: &BatchOptions,
) -> (Option<FlangeParams>, Result<PathBuf, FlangeError>) {
    let validated = item
        .spec
        .as_ref()
        .map_err(Clone::clone)
        .and_then(FlangeSpec::validate);
    let params = match validated {
        Ok(params) => params,
        Err(e) => return (None, Err(e.into())),
    };
    let params = match options.format_override {
        Some(format) => params.with_output_format(format),
        None => params,
    };
    let outcome = generate(kernel, &params, dest_stem, &options.export);
    (Some(params), outcome)
}

/// Generate every item of a batch
///
/// Returns `Err` only when the output directory cannot be created or the
/// manifest cannot be written; per-item failures are part of the report.
pub fn run_batch(
    kernel: &dyn CadKernel,
    items: &[BatchItem],
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    std::fs::create_dir_all(&options.output_dir).map_err(|e| BatchError::OutputDir {
        path: options.output_dir.clone(),
        reason: e.to_string(),
    })?;

    tracing::info!(
        items = items.len(),
        output_dir = %options.output_dir.display(),
        kernel = kernel.name(),
        "starting batch"
    );

    let total = items.len();
    let mut results = Vec::with_capacity(total);
    for ((index, item), name) in items.iter().enumerate().zip(assign_names(items)) {
        let dest_stem = options.output_dir.join(&name);
        let (params, outcome) = process_item(kernel, item, &dest_stem, options);

        if let Err(err) = &outcome {
            tracing::warn!(index, name = %name, spec = ?item.spec, "flange skipped: {err}");
        }

        results.push(BatchResult {
            index,
            name,
            spec: item.spec.as_ref().ok().cloned(),
            params,
            outcome,
        });

        if (index + 1) % PROGRESS_INTERVAL == 0 {
            tracing::info!(done = index + 1, total, "batch progress");
        }
    }

    let mut report = BatchReport {
        output_dir: options.output_dir.clone(),
        results,
        manifest_path: None,
    };

    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        total,
        "batch finished"
    );

    if options.write_manifest {
        report.manifest_path = Some(write_manifest(&options.output_dir, &report)?);
    }

    Ok(report)
}
