//! Parametric flange generator core
//!
//! This crate contains everything between a parameter record and a file on
//! disk:
//! - Params: raw records and validated parameter sets
//! - Geometry: hole layout, feasibility checks and solid construction
//! - Export: STEP and STL output through the CAD kernel
//! - Batch: isolated per-item generation with a final report
//! - Config, variations and manifest for dataset generation

pub mod batch;
pub mod config;
pub mod constants;
pub mod export;
pub mod geometry;
pub mod manifest;
pub mod params;
pub mod variations;

#[cfg(test)]
mod test_support;

pub use batch::*;
pub use config::*;
pub use constants::*;
pub use export::*;
pub use geometry::*;
pub use manifest::*;
pub use params::*;
pub use variations::*;
