//! Scoped solid handles
//!
//! Kernels keep solid data until it is explicitly released. `OwnedSolid`
//! ties that release to a Rust scope so intermediate results of a boolean
//! chain, and solids of failed operations, never linger in the kernel.

use std::fmt;

use super::{Axis3D, BooleanType, CadKernel, CadResult, Solid};

/// A solid handle that releases its kernel data when dropped
pub struct OwnedSolid<'k> {
    kernel: &'k dyn CadKernel,
    solid: Solid,
}

impl<'k> OwnedSolid<'k> {
    /// Take ownership of a solid created by `kernel`
    pub fn new(kernel: &'k dyn CadKernel, solid: Solid) -> Self {
        Self { kernel, solid }
    }

    /// Create a cylinder and own it
    pub fn cylinder(
        kernel: &'k dyn CadKernel,
        axis: &Axis3D,
        radius: f64,
        height: f64,
    ) -> CadResult<Self> {
        let solid = kernel.create_cylinder(axis, radius, height)?;
        Ok(Self::new(kernel, solid))
    }

    /// The underlying handle
    pub fn solid(&self) -> &Solid {
        &self.solid
    }

    /// The kernel holding this solid's data
    pub fn kernel(&self) -> &'k dyn CadKernel {
        self.kernel
    }

    /// Combine with `tool`; both operands stay alive and owned by the caller
    pub fn boolean(&self, tool: &OwnedSolid<'k>, op: BooleanType) -> CadResult<OwnedSolid<'k>> {
        let solid = self.kernel.boolean(&self.solid, &tool.solid, op)?;
        Ok(Self::new(self.kernel, solid))
    }
}

impl Drop for OwnedSolid<'_> {
    fn drop(&mut self) {
        self.kernel.release(&self.solid);
    }
}

impl fmt::Debug for OwnedSolid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedSolid")
            .field("kernel", &self.kernel.name())
            .field("solid", &self.solid.id)
            .finish()
    }
}
