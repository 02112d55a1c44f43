//! Flange geometry
//!
//! Geometry is produced in two steps. [`plan_flange`] is a pure function
//! that lays out the base disk, the optional bore and the bolt-hole pattern
//! and rejects impossible layouts. [`build_flange`] then realizes a plan
//! against a [`CadKernel`]: one base cylinder with every cut subtracted from
//! it.

use std::f64::consts::{PI, TAU};

use flange_cad::{Axis3D, BooleanType, CadError, CadKernel, OwnedSolid, Solid};
use glam::{DVec2, DVec3};
use serde::Serialize;

use crate::constants::{CUTTER_OVERSHOOT, MAX_HOLE_COUNT};
use crate::params::FlangeParams;

/// Geometry-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeometryError {
    #[error(
        "hole {index} reaches the outer edge: center radius {center_radius:.3} + hole radius \
         {hole_radius:.3} >= flange radius {flange_radius:.3}"
    )]
    HoleOutsideFlange {
        index: u32,
        center_radius: f64,
        hole_radius: f64,
        flange_radius: f64,
    },

    #[error(
        "bolt holes break into the center bore: bolt radius {bolt_radius:.3} - hole radius \
         {hole_radius:.3} <= bore radius {bore_radius:.3}"
    )]
    HoleIntersectsBore {
        bolt_radius: f64,
        hole_radius: f64,
        bore_radius: f64,
    },

    #[error(
        "adjacent bolt holes overlap: center spacing {spacing:.3} <= hole diameter {hole_diameter:.3}"
    )]
    HolesOverlap { spacing: f64, hole_diameter: f64 },

    #[error("{count} bolt holes requested, at most {max} are supported")]
    TooManyHoles { count: u32, max: u32 },

    #[error("CAD kernel error: {0}")]
    Kernel(#[from] CadError),
}

/// One bolt hole on the bolt circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HolePlacement {
    /// Position in the pattern, starting at angle 0
    pub index: u32,
    /// Angle from +X in radians
    pub angle: f64,
    /// Hole center in the flange plane
    pub center: DVec2,
}

/// Evenly spaced hole centers: `θ_i = 2π·i / count` on a circle of `bolt_radius`
pub fn hole_positions(count: u32, bolt_radius: f64) -> Vec<HolePlacement> {
    (0..count)
        .map(|index| {
            let angle = TAU * f64::from(index) / f64::from(count);
            HolePlacement {
                index,
                angle,
                center: DVec2::new(bolt_radius * angle.cos(), bolt_radius * angle.sin()),
            }
        })
        .collect()
}

/// Check that `count` holes on a circle of `bolt_radius` fit between the
/// bore and the outer edge without touching each other.
///
/// Works from the count alone, so no placement is allocated for a pattern
/// that cannot be built. `bore_radius` of 0 means there is no bore.
pub fn check_hole_pattern(
    count: u32,
    flange_radius: f64,
    bore_radius: f64,
    bolt_radius: f64,
    hole_radius: f64,
) -> Result<(), GeometryError> {
    if count == 0 {
        return Ok(());
    }

    // Every center sits on the bolt circle, so hole 0 is as far out as any
    if bolt_radius + hole_radius >= flange_radius {
        return Err(GeometryError::HoleOutsideFlange {
            index: 0,
            center_radius: bolt_radius,
            hole_radius,
            flange_radius,
        });
    }

    if bore_radius > 0.0 && bolt_radius - hole_radius <= bore_radius {
        return Err(GeometryError::HoleIntersectsBore {
            bolt_radius,
            hole_radius,
            bore_radius,
        });
    }

    if count >= 2 {
        let spacing = 2.0 * bolt_radius * (PI / f64::from(count)).sin();
        if spacing <= 2.0 * hole_radius {
            return Err(GeometryError::HolesOverlap {
                spacing,
                hole_diameter: 2.0 * hole_radius,
            });
        }
    }

    if count > MAX_HOLE_COUNT {
        return Err(GeometryError::TooManyHoles {
            count,
            max: MAX_HOLE_COUNT,
        });
    }

    Ok(())
}

/// Layout of a flange, independent of any CAD kernel
///
/// The flange is centered on the origin with its axis along +Z, so it spans
/// `z ∈ [-thickness/2, thickness/2]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlangePlan {
    pub outer_radius: f64,
    pub thickness: f64,
    /// `None` when there is no center bore
    pub bore_radius: Option<f64>,
    pub bolt_radius: f64,
    pub hole_radius: f64,
    pub holes: Vec<HolePlacement>,
}

impl FlangePlan {
    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }

    pub fn has_bore(&self) -> bool {
        self.bore_radius.is_some()
    }

    /// Axis of the base cylinder, starting at the bottom face
    fn base_axis(&self) -> Axis3D {
        Axis3D::z().through(DVec3::new(0.0, 0.0, -self.thickness / 2.0))
    }

    /// Axis of a through-cutter centered at `center`, starting below the bottom face
    fn cutter_axis(&self, center: DVec2) -> Axis3D {
        Axis3D::z().through(DVec3::new(
            center.x,
            center.y,
            -self.thickness / 2.0 - CUTTER_OVERSHOOT,
        ))
    }

    /// Cutters reach past both faces so no cap is coplanar with the flange
    fn cutter_height(&self) -> f64 {
        self.thickness + 2.0 * CUTTER_OVERSHOOT
    }
}

/// Lay out a flange and check that it can be built
pub fn plan_flange(params: &FlangeParams) -> Result<FlangePlan, GeometryError> {
    let outer_radius = params.flange_diameter() / 2.0;
    let bolt_radius = params.bolt_circle_diameter() / 2.0;
    let hole_radius = params.hole_diameter() / 2.0;
    let bore_radius = params
        .has_center_hole()
        .then(|| params.center_hole_diameter() / 2.0);

    check_hole_pattern(
        params.hole_count(),
        outer_radius,
        bore_radius.unwrap_or(0.0),
        bolt_radius,
        hole_radius,
    )?;
    let holes = hole_positions(params.hole_count(), bolt_radius);

    Ok(FlangePlan {
        outer_radius,
        thickness: params.flange_thickness(),
        bore_radius,
        bolt_radius,
        hole_radius,
        holes,
    })
}

/// A built flange solid
///
/// Owns its kernel handle; the kernel data is released when this value is
/// dropped.
#[derive(Debug)]
pub struct FlangeSolid<'k> {
    body: OwnedSolid<'k>,
    plan: FlangePlan,
}

impl<'k> FlangeSolid<'k> {
    /// The kernel handle
    pub fn solid(&self) -> &Solid {
        self.body.solid()
    }

    /// The kernel that holds the geometry
    pub fn kernel(&self) -> &'k dyn CadKernel {
        self.body.kernel()
    }

    /// The layout this solid was built from
    pub fn plan(&self) -> &FlangePlan {
        &self.plan
    }
}

/// Build a flange solid
///
/// All layout checks run before the first boolean operation.
pub fn build_flange<'k>(
    kernel: &'k dyn CadKernel,
    params: &FlangeParams,
) -> Result<FlangeSolid<'k>, GeometryError> {
    let plan = plan_flange(params)?;
    let body = realize(kernel, &plan)?;
    Ok(FlangeSolid { body, plan })
}

fn realize<'k>(kernel: &'k dyn CadKernel, plan: &FlangePlan) -> Result<OwnedSolid<'k>, CadError> {
    let mut body = OwnedSolid::cylinder(kernel, &plan.base_axis(), plan.outer_radius, plan.thickness)?;
    tracing::debug!(
        diameter = plan.outer_radius * 2.0,
        thickness = plan.thickness,
        "base cylinder created"
    );

    if let Some(bore_radius) = plan.bore_radius {
        let cutter = OwnedSolid::cylinder(
            kernel,
            &plan.cutter_axis(DVec2::ZERO),
            bore_radius,
            plan.cutter_height(),
        )?;
        body = body.boolean(&cutter, BooleanType::Subtract)?;
        tracing::debug!(diameter = bore_radius * 2.0, "center bore cut");
    }

    for hole in &plan.holes {
        let cutter = OwnedSolid::cylinder(
            kernel,
            &plan.cutter_axis(hole.center),
            plan.hole_radius,
            plan.cutter_height(),
        )?;
        body = body.boolean(&cutter, BooleanType::Subtract)?;
    }
    if !plan.holes.is_empty() {
        tracing::debug!(
            count = plan.holes.len(),
            diameter = plan.hole_radius * 2.0,
            bolt_radius = plan.bolt_radius,
            "bolt holes cut"
        );
    }

    Ok(body)
}
