//! Truck CAD Kernel Backend
//!
//! Pure Rust B-Rep kernel using the Truck library. Cylinders are built from
//! exact circles, booleans go through `truck-shapeops`, tessellation through
//! `truck-meshalgo` and STEP output through `truck-stepio`.

use std::collections::HashMap;
use std::path::Path;

use glam::DVec3;
use parking_lot::Mutex;
use uuid::Uuid;

use truck_meshalgo::tessellation::{MeshableShape, MeshedShape};
use truck_modeling::{InnerSpace, Point3, Rad, Solid as TruckSolid, Vector3, builder};
use truck_polymesh::PolygonMesh;
use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModel};

use super::{
    Axis3D, BooleanType, CadError, CadKernel, CadResult, Solid, StepExportOptions,
    TessellatedMesh,
};

/// Default tolerance handed to `truck-shapeops`
pub const DEFAULT_BOOLEAN_TOLERANCE: f64 = 0.05;

/// Sweep angle that makes `rsweep` close the circle on itself
const FULL_TURN: Rad<f64> = Rad(7.0);

/// Truck-based CAD kernel
pub struct TruckKernel {
    /// Storage for solid data (keyed by UUID)
    solids: Mutex<HashMap<Uuid, TruckSolid>>,
    /// Tolerance for boolean operations
    boolean_tolerance: f64,
}

impl TruckKernel {
    /// Create a new Truck kernel
    pub fn new() -> Self {
        Self::with_boolean_tolerance(DEFAULT_BOOLEAN_TOLERANCE)
    }

    /// Create a kernel with a custom boolean tolerance
    pub fn with_boolean_tolerance(boolean_tolerance: f64) -> Self {
        Self {
            solids: Mutex::new(HashMap::new()),
            boolean_tolerance,
        }
    }

    /// Store a solid and return a Solid reference
    fn store_solid(&self, solid: TruckSolid) -> Solid {
        let id = Uuid::new_v4();
        self.solids.lock().insert(id, solid);
        Solid::new(id)
    }

    /// Get a stored solid by ID
    fn get_solid(&self, solid: &Solid) -> CadResult<TruckSolid> {
        self.solids
            .lock()
            .get(&solid.id)
            .cloned()
            .ok_or(CadError::SolidNotFound(solid.id))
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn point(v: DVec3) -> Point3 {
    Point3::new(v.x, v.y, v.z)
}

fn vector(v: DVec3) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

/// A unit vector perpendicular to `normal`
fn radial_direction(normal: Vector3) -> Vector3 {
    let up = if normal.z.abs() < 0.9 {
        Vector3::new(0.0, 0.0, 1.0)
    } else {
        Vector3::new(1.0, 0.0, 0.0)
    };
    normal.cross(up).normalize()
}

/// Flatten a polygon mesh into triangles, fanning quads and n-gons
fn to_tessellated_mesh(polygon: &PolygonMesh) -> TessellatedMesh {
    let vertices = polygon
        .positions()
        .iter()
        .map(|p| [p.x as f32, p.y as f32, p.z as f32])
        .collect();

    let mut indices = Vec::new();
    for tri in polygon.tri_faces() {
        indices.extend(tri.iter().map(|v| v.pos as u32));
    }
    for quad in polygon.quad_faces() {
        indices.extend(
            [quad[0].pos, quad[1].pos, quad[2].pos, quad[0].pos, quad[2].pos, quad[3].pos]
                .map(|p| p as u32),
        );
    }
    for face in polygon.other_faces() {
        for i in 1..face.len().saturating_sub(1) {
            indices.extend([face[0].pos, face[i].pos, face[i + 1].pos].map(|p| p as u32));
        }
    }

    TessellatedMesh { vertices, indices }
}

impl CadKernel for TruckKernel {
    fn name(&self) -> &str {
        "truck"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn create_cylinder(&self, axis: &Axis3D, radius: f64, height: f64) -> CadResult<Solid> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(CadError::InvalidPrimitive(format!(
                "Cylinder radius must be positive, got {radius}"
            )));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(CadError::InvalidPrimitive(format!(
                "Cylinder height must be positive, got {height}"
            )));
        }

        let origin = point(axis.origin);
        let dir = vector(axis.direction);

        // Exact circle: sweep one vertex a full turn around the axis
        let seed = builder::vertex(origin + radial_direction(dir) * radius);
        let circle = builder::rsweep(&seed, origin, dir, FULL_TURN);
        let disk = builder::try_attach_plane(&[circle])
            .map_err(|e| CadError::OperationFailed(format!("Failed to create face: {:?}", e)))?;

        let solid = builder::tsweep(&disk, dir * height);
        tracing::debug!(radius, height, "truck: cylinder created");

        Ok(self.store_solid(solid))
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        let target = self.get_solid(a)?;
        let mut tool = self.get_solid(b)?;
        let tol = self.boolean_tolerance;

        let result = match op {
            BooleanType::Union => truck_shapeops::or(&target, &tool, tol),
            BooleanType::Intersect => truck_shapeops::and(&target, &tool, tol),
            BooleanType::Subtract => {
                // A - B == A & !B
                tool.not();
                truck_shapeops::and(&target, &tool, tol)
            }
        };

        let solid = result.ok_or_else(|| {
            CadError::BooleanFailed(format!(
                "{:?} of {} and {} produced no solid",
                op, a.id, b.id
            ))
        })?;

        Ok(self.store_solid(solid))
    }

    fn tessellate(&self, solid: &Solid, tolerance: f64) -> CadResult<TessellatedMesh> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(CadError::TessellationFailed(format!(
                "Tolerance must be positive, got {tolerance}"
            )));
        }

        let shape = self.get_solid(solid)?;
        let polygon: PolygonMesh = shape.triangulation(tolerance).to_polygon();
        let mesh = to_tessellated_mesh(&polygon);

        if mesh.is_empty() {
            return Err(CadError::TessellationFailed(format!(
                "Solid {} produced no triangles",
                solid.id
            )));
        }

        tracing::debug!(triangles = mesh.triangle_count(), "truck: tessellated");
        Ok(mesh)
    }

    fn export_step(
        &self,
        solid: &Solid,
        path: &Path,
        options: &StepExportOptions,
    ) -> CadResult<()> {
        let shape = self.get_solid(solid)?;

        let mut header = StepHeaderDescriptor {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            organization_system: "flange-cad (truck)".to_owned(),
            ..Default::default()
        };
        if let Some(time_stamp) = &options.time_stamp {
            header.time_stamp = time_stamp.clone();
        }

        let compressed = shape.compress();
        let step_string = CompleteStepDisplay::new(StepModel::from(&compressed), header).to_string();

        std::fs::write(path, step_string).map_err(|e| CadError::FileIo(e.to_string()))?;
        Ok(())
    }

    fn release(&self, solid: &Solid) {
        self.solids.lock().remove(&solid.id);
    }

    fn live_solids(&self) -> usize {
        self.solids.lock().len()
    }
}
