//! CAD Kernel Abstraction Layer
//!
//! Provides a trait-based abstraction over geometry kernels so the flange
//! builder never depends on a concrete backend.

mod owned;
mod traits;

#[cfg(feature = "truck")]
mod truck;

pub use owned::OwnedSolid;
pub use traits::*;

#[cfg(feature = "truck")]
pub use truck::TruckKernel;
