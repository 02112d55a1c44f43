//! Export options for flange files

use flange_cad::StepExportOptions;

use crate::constants::{DEFAULT_STL_TOLERANCE, REPRODUCIBLE_STEP_TIME_STAMP};

/// Export options for flange files
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Replace files that already exist instead of failing
    pub overwrite: bool,
    /// Chordal tolerance used when tessellating for STL (mm)
    pub stl_tolerance: f64,
    /// STEP header fields
    pub step: StepExportOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            stl_tolerance: DEFAULT_STL_TOLERANCE,
            step: StepExportOptions {
                time_stamp: Some(REPRODUCIBLE_STEP_TIME_STAMP.to_string()),
            },
        }
    }
}
