//! Global constants for flange-core

/// Default outer diameter (mm)
pub const DEFAULT_FLANGE_DIAMETER: f64 = 50.0;

/// Default thickness (mm)
pub const DEFAULT_FLANGE_THICKNESS: f64 = 8.0;

/// Default number of bolt holes
pub const DEFAULT_HOLE_COUNT: i64 = 6;

/// Largest bolt-hole pattern the builder lays out
pub const MAX_HOLE_COUNT: u32 = 1024;

/// Default bolt hole diameter (mm)
pub const DEFAULT_HOLE_DIAMETER: f64 = 5.5;

/// Default center bore diameter (mm)
pub const DEFAULT_CENTER_HOLE_DIAMETER: f64 = 12.0;

/// Bolt circle diameter as a fraction of the outer diameter, when not given
pub const DEFAULT_BOLT_CIRCLE_RATIO: f64 = 0.8;

/// Accepted range for an explicit bolt circle ratio
pub const BOLT_CIRCLE_RATIO_RANGE: (f64, f64) = (0.1, 0.9);

/// How far cutting tools reach past each face of the flange (mm)
pub const CUTTER_OVERSHOOT: f64 = 1.0;

/// Default chordal tolerance for STL tessellation (mm)
pub const DEFAULT_STL_TOLERANCE: f64 = 0.01;

/// STEP header time stamp used for reproducible output
pub const REPRODUCIBLE_STEP_TIME_STAMP: &str = "1970-01-01T00:00:00";

/// Dataset manifest file name
pub const MANIFEST_FILE_NAME: &str = "metadata.json";
