//! In-memory kernel for exercising the builder, exporter and batch driver
//! without a real B-Rep backend.

use std::collections::HashMap;
use std::path::Path;

use flange_cad::{
    Axis3D, BooleanType, CadError, CadKernel, CadResult, Solid, StepExportOptions,
    TessellatedMesh,
};
use parking_lot::Mutex;
use uuid::Uuid;

/// A kernel call, in the order it was made
#[derive(Debug, Clone, PartialEq)]
pub enum KernelOp {
    Cylinder {
        axis: Axis3D,
        radius: f64,
        height: f64,
    },
    Boolean(BooleanType),
}

/// Records calls and describes each solid as text
///
/// STEP export writes that description; tessellation returns one triangle
/// per primitive that went into the solid.
#[derive(Default)]
pub struct RecordingKernel {
    ops: Mutex<Vec<KernelOp>>,
    solids: Mutex<HashMap<Uuid, (String, usize)>>,
    fail_booleans: bool,
}

impl RecordingKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A kernel whose boolean operations always fail
    pub fn failing_booleans() -> Self {
        Self {
            fail_booleans: true,
            ..Self::default()
        }
    }

    pub fn ops(&self) -> Vec<KernelOp> {
        self.ops.lock().clone()
    }

    fn store(&self, description: String, primitives: usize) -> Solid {
        let id = Uuid::new_v4();
        self.solids.lock().insert(id, (description, primitives));
        Solid::new(id)
    }

    fn lookup(&self, solid: &Solid) -> CadResult<(String, usize)> {
        self.solids
            .lock()
            .get(&solid.id)
            .cloned()
            .ok_or(CadError::SolidNotFound(solid.id))
    }
}

impl CadKernel for RecordingKernel {
    fn name(&self) -> &str {
        "recording"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn create_cylinder(&self, axis: &Axis3D, radius: f64, height: f64) -> CadResult<Solid> {
        if radius <= 0.0 || height <= 0.0 {
            return Err(CadError::InvalidPrimitive(format!("r={radius} h={height}")));
        }
        self.ops.lock().push(KernelOp::Cylinder {
            axis: *axis,
            radius,
            height,
        });
        let o = axis.origin;
        Ok(self.store(
            format!("cyl(r={radius:.4}, h={height:.4}, at=[{:.4}, {:.4}, {:.4}])", o.x, o.y, o.z),
            1,
        ))
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        let (da, na) = self.lookup(a)?;
        let (db, nb) = self.lookup(b)?;
        self.ops.lock().push(KernelOp::Boolean(op));
        if self.fail_booleans {
            return Err(CadError::BooleanFailed("recording kernel refuses".into()));
        }
        Ok(self.store(format!("{op:?}({da}, {db})"), na + nb))
    }

    fn tessellate(&self, solid: &Solid, _tolerance: f64) -> CadResult<TessellatedMesh> {
        let (_, primitives) = self.lookup(solid)?;
        let mut mesh = TessellatedMesh::new();
        for i in 0..primitives {
            let base = mesh.vertices.len() as u32;
            let z = i as f32;
            mesh.vertices
                .extend([[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]]);
            mesh.indices.extend([base, base + 1, base + 2]);
        }
        Ok(mesh)
    }

    fn export_step(
        &self,
        solid: &Solid,
        path: &Path,
        options: &StepExportOptions,
    ) -> CadResult<()> {
        let (description, _) = self.lookup(solid)?;
        let stamp = options.time_stamp.as_deref().unwrap_or("now");
        std::fs::write(path, format!("ISO-10303-21;\n/* {stamp} */\n{description}\n"))
            .map_err(|e| CadError::FileIo(e.to_string()))
    }

    fn release(&self, solid: &Solid) {
        self.solids.lock().remove(&solid.id);
    }

    fn live_solids(&self) -> usize {
        self.solids.lock().len()
    }
}
