//! CAD Kernel trait definitions
//!
//! These traits define the interface that all CAD kernels must implement.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for CAD kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Invalid primitive: {0}")]
    InvalidPrimitive(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("Tessellation failed: {0}")]
    TessellationFailed(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Solid not found: {0}")]
    SolidNotFound(Uuid),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("File I/O error: {0}")]
    FileIo(String),
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// A tessellated mesh output from the CAD kernel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TessellatedMesh {
    /// Vertex positions (3 floats per vertex)
    pub vertices: Vec<[f32; 3]>,
    /// Triangle indices (3 indices per triangle)
    pub indices: Vec<u32>,
}

impl TessellatedMesh {
    /// Create an empty tessellated mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of every triangle, in index order.
    ///
    /// Triangles referencing a missing vertex are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.vertices.get(tri[0] as usize)?,
                *self.vertices.get(tri[1] as usize)?,
                *self.vertices.get(tri[2] as usize)?,
            ])
        })
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(mut min, mut max), v| {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
            (min, max)
        }))
    }
}

/// A 3D solid body
///
/// This is only a handle; the geometry lives inside the kernel that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Solid {
    /// Unique identifier
    pub id: Uuid,
}

impl Solid {
    /// Create a new solid with the given ID
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Axis definition for cylinder placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis3D {
    /// Origin point of the axis
    pub origin: DVec3,
    /// Direction of the axis (normalized)
    pub direction: DVec3,
}

impl Axis3D {
    /// Create an axis from origin and direction
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Z axis at origin
    pub fn z() -> Self {
        Self::new(DVec3::ZERO, DVec3::Z)
    }

    /// Same direction, origin moved to `origin`
    pub fn through(self, origin: DVec3) -> Self {
        Self { origin, ..self }
    }
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanType {
    /// Union (add)
    Union,
    /// Subtraction (cut)
    Subtract,
    /// Intersection (common)
    Intersect,
}

/// Options for STEP file export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepExportOptions {
    /// Fixed header time stamp. `None` lets the writer use the current time.
    pub time_stamp: Option<String>,
}

/// The main CAD kernel trait
///
/// Implementations of this trait provide the actual geometry operations.
/// Solids are referenced by handle; a kernel keeps their data until
/// [`CadKernel::release`] is called.
pub trait CadKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Create a right circular cylinder
    ///
    /// # Arguments
    /// * `axis` - The base circle is centered on `axis.origin`; the cylinder
    ///   extends along `axis.direction`
    /// * `radius` - Cylinder radius
    /// * `height` - Length along the axis
    fn create_cylinder(&self, axis: &Axis3D, radius: f64, height: f64) -> CadResult<Solid>;

    /// Perform a boolean operation on two solids
    ///
    /// # Arguments
    /// * `a` - The first solid
    /// * `b` - The second solid
    /// * `op` - The boolean operation type
    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid>;

    /// Tessellate a solid into triangles
    ///
    /// # Arguments
    /// * `solid` - The solid to tessellate
    /// * `tolerance` - The tessellation tolerance (lower = more triangles)
    fn tessellate(&self, solid: &Solid, tolerance: f64) -> CadResult<TessellatedMesh>;

    /// Export a solid to a STEP file
    ///
    /// # Arguments
    /// * `solid` - The solid to export
    /// * `path` - Output file path
    /// * `options` - Export options
    fn export_step(&self, solid: &Solid, path: &Path, options: &StepExportOptions)
    -> CadResult<()>;

    /// Drop the kernel data behind a solid handle
    fn release(&self, solid: &Solid);

    /// Number of solids currently held by the kernel
    fn live_solids(&self) -> usize;
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn create_cylinder(&self, _axis: &Axis3D, _radius: f64, _height: f64) -> CadResult<Solid> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }

    fn boolean(&self, _a: &Solid, _b: &Solid, _op: BooleanType) -> CadResult<Solid> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }

    fn tessellate(&self, _solid: &Solid, _tolerance: f64) -> CadResult<TessellatedMesh> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }

    fn export_step(
        &self,
        _solid: &Solid,
        _path: &Path,
        _options: &StepExportOptions,
    ) -> CadResult<()> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available for STEP export".into(),
        ))
    }

    fn release(&self, _solid: &Solid) {}

    fn live_solids(&self) -> usize {
        0
    }
}

/// Get the default CAD kernel based on available features
pub fn default_kernel() -> Box<dyn CadKernel> {
    #[cfg(feature = "truck")]
    {
        Box::new(super::TruckKernel::new())
    }

    #[cfg(not(feature = "truck"))]
    {
        Box::new(NullKernel)
    }
}
