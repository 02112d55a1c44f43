//! CAD Kernel Abstraction
//!
//! This crate provides:
//! - An abstract CAD kernel trait covering the operations the flange
//!   generator needs (cylinder primitives, booleans, tessellation, STEP export)
//! - A Truck (pure Rust B-Rep) backend
//! - A null kernel for builds without any backend

pub mod kernel;

// Re-exports for convenience
pub use kernel::{
    Axis3D, BooleanType, CadError, CadKernel, CadResult, NullKernel, OwnedSolid, Solid,
    StepExportOptions, TessellatedMesh, default_kernel,
};

#[cfg(feature = "truck")]
pub use kernel::TruckKernel;
