//! Flange parameter sets
//!
//! [`FlangeSpec`] is the raw, deserializable record read from configuration
//! files or the command line. [`FlangeParams`] is the validated, immutable
//! parameter set the geometry builder consumes. The only way from one to the
//! other is [`FlangeSpec::validate`] (or `TryFrom`), which either yields a
//! complete parameter set or names the first violated constraint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BOLT_CIRCLE_RATIO_RANGE, DEFAULT_BOLT_CIRCLE_RATIO, DEFAULT_CENTER_HOLE_DIAMETER,
    DEFAULT_FLANGE_DIAMETER, DEFAULT_FLANGE_THICKNESS, DEFAULT_HOLE_COUNT, DEFAULT_HOLE_DIAMETER,
};

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    /// ISO 10303-21 exchange file
    #[default]
    Step,
    /// Binary stereolithography mesh
    Stl,
}

impl OutputFormat {
    /// File extension (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Step => "step",
            OutputFormat::Stl => "stl",
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Step => "STEP",
            OutputFormat::Stl => "STL",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STEP" | "STP" => Ok(OutputFormat::Step),
            "STL" => Ok(OutputFormat::Stl),
            _ => Err(ValidationError::new(
                "output_format",
                format!("must be one of STEP, STL (got {s:?})"),
            )),
        }
    }
}

/// A parameter that violated its constraint
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field} {constraint}")]
pub struct ValidationError {
    /// Name of the offending field
    pub field: &'static str,
    /// The violated constraint, phrased to follow the field name
    pub constraint: String,
}

impl ValidationError {
    pub fn new(field: &'static str, constraint: impl Into<String>) -> Self {
        Self {
            field,
            constraint: constraint.into(),
        }
    }
}

/// Raw flange parameters as found in configuration files
///
/// Missing fields fall back to the defaults in [`crate::constants`].
/// Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlangeSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flange_diameter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flange_thickness: Option<f64>,
    /// Signed so that negative counts surface as validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_diameter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_hole_diameter: Option<f64>,
    /// Explicit bolt circle diameter; takes precedence over the ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bolt_circle_diameter: Option<f64>,
    /// Bolt circle diameter as a fraction of the flange diameter
    #[serde(
        alias = "bolt_circle_percentage",
        skip_serializing_if = "Option::is_none"
    )]
    pub bolt_circle_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

/// Check that `value` is finite and strictly positive
fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::new(
            field,
            format!("must be a positive finite number (got {value})"),
        ))
    }
}

impl FlangeSpec {
    /// Validate the record and produce an immutable parameter set
    pub fn validate(&self) -> Result<FlangeParams, ValidationError> {
        let flange_diameter = positive(
            "flange_diameter",
            self.flange_diameter.unwrap_or(DEFAULT_FLANGE_DIAMETER),
        )?;
        let flange_thickness = positive(
            "flange_thickness",
            self.flange_thickness.unwrap_or(DEFAULT_FLANGE_THICKNESS),
        )?;

        let raw_count = self.hole_count.unwrap_or(DEFAULT_HOLE_COUNT);
        let hole_count = u32::try_from(raw_count).map_err(|_| {
            ValidationError::new(
                "hole_count",
                format!("must be a non-negative integer (got {raw_count})"),
            )
        })?;

        let hole_diameter = positive(
            "hole_diameter",
            self.hole_diameter.unwrap_or(DEFAULT_HOLE_DIAMETER),
        )?;
        if hole_diameter >= flange_diameter {
            return Err(ValidationError::new(
                "hole_diameter",
                format!(
                    "must be less than flange_diameter ({hole_diameter} >= {flange_diameter})"
                ),
            ));
        }

        let center_hole_diameter = self
            .center_hole_diameter
            .unwrap_or(DEFAULT_CENTER_HOLE_DIAMETER);
        if !(center_hole_diameter.is_finite() && center_hole_diameter >= 0.0) {
            return Err(ValidationError::new(
                "center_hole_diameter",
                format!("must be a non-negative finite number (got {center_hole_diameter})"),
            ));
        }
        if center_hole_diameter >= flange_diameter {
            return Err(ValidationError::new(
                "center_hole_diameter",
                format!(
                    "must be less than flange_diameter ({center_hole_diameter} >= {flange_diameter})"
                ),
            ));
        }

        let bolt_circle_diameter = match (self.bolt_circle_diameter, self.bolt_circle_ratio) {
            (Some(diameter), _) => positive("bolt_circle_diameter", diameter)?,
            (None, Some(ratio)) => {
                let (min, max) = BOLT_CIRCLE_RATIO_RANGE;
                if !(ratio.is_finite() && (min..=max).contains(&ratio)) {
                    return Err(ValidationError::new(
                        "bolt_circle_ratio",
                        format!("must be between {min} and {max} (got {ratio})"),
                    ));
                }
                flange_diameter * ratio
            }
            (None, None) => flange_diameter * DEFAULT_BOLT_CIRCLE_RATIO,
        };
        if bolt_circle_diameter + hole_diameter >= flange_diameter {
            return Err(ValidationError::new(
                "bolt_circle_diameter",
                format!(
                    "plus hole_diameter must be less than flange_diameter \
                     ({bolt_circle_diameter} + {hole_diameter} >= {flange_diameter})"
                ),
            ));
        }

        let output_format = match &self.output_format {
            Some(name) => name.parse()?,
            None => OutputFormat::default(),
        };

        Ok(FlangeParams {
            flange_diameter,
            flange_thickness,
            hole_count,
            hole_diameter,
            center_hole_diameter,
            bolt_circle_diameter,
            output_format,
        })
    }
}

impl From<&FlangeParams> for FlangeSpec {
    fn from(params: &FlangeParams) -> Self {
        Self {
            flange_diameter: Some(params.flange_diameter),
            flange_thickness: Some(params.flange_thickness),
            hole_count: Some(i64::from(params.hole_count)),
            hole_diameter: Some(params.hole_diameter),
            center_hole_diameter: Some(params.center_hole_diameter),
            bolt_circle_diameter: Some(params.bolt_circle_diameter),
            bolt_circle_ratio: None,
            output_format: Some(params.output_format.name().to_string()),
        }
    }
}

/// A validated flange parameter set
///
/// All lengths are millimeters. Instances can only be obtained through
/// validation, so every invariant holds for the lifetime of the value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlangeParams {
    flange_diameter: f64,
    flange_thickness: f64,
    hole_count: u32,
    hole_diameter: f64,
    center_hole_diameter: f64,
    bolt_circle_diameter: f64,
    output_format: OutputFormat,
}

impl Default for FlangeParams {
    fn default() -> Self {
        Self {
            flange_diameter: DEFAULT_FLANGE_DIAMETER,
            flange_thickness: DEFAULT_FLANGE_THICKNESS,
            hole_count: DEFAULT_HOLE_COUNT as u32,
            hole_diameter: DEFAULT_HOLE_DIAMETER,
            center_hole_diameter: DEFAULT_CENTER_HOLE_DIAMETER,
            bolt_circle_diameter: DEFAULT_FLANGE_DIAMETER * DEFAULT_BOLT_CIRCLE_RATIO,
            output_format: OutputFormat::Step,
        }
    }
}

impl TryFrom<FlangeSpec> for FlangeParams {
    type Error = ValidationError;

    fn try_from(spec: FlangeSpec) -> Result<Self, Self::Error> {
        spec.validate()
    }
}

impl TryFrom<&FlangeSpec> for FlangeParams {
    type Error = ValidationError;

    fn try_from(spec: &FlangeSpec) -> Result<Self, Self::Error> {
        spec.validate()
    }
}

impl FlangeParams {
    pub fn flange_diameter(&self) -> f64 {
        self.flange_diameter
    }

    pub fn flange_thickness(&self) -> f64 {
        self.flange_thickness
    }

    pub fn hole_count(&self) -> u32 {
        self.hole_count
    }

    pub fn hole_diameter(&self) -> f64 {
        self.hole_diameter
    }

    pub fn center_hole_diameter(&self) -> f64 {
        self.center_hole_diameter
    }

    pub fn bolt_circle_diameter(&self) -> f64 {
        self.bolt_circle_diameter
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Whether a center bore is cut
    pub fn has_center_hole(&self) -> bool {
        self.center_hole_diameter > 0.0
    }

    /// Same parameters, different output format
    pub fn with_output_format(self, output_format: OutputFormat) -> Self {
        Self {
            output_format,
            ..self
        }
    }

    /// A deterministic, filesystem-safe name derived from the geometry
    ///
    /// e.g. `flange_d50_t8_n6_h5p5_c12_b40`
    pub fn file_stem(&self) -> String {
        format!(
            "flange_d{}_t{}_n{}_h{}_c{}_b{}",
            stem_number(self.flange_diameter),
            stem_number(self.flange_thickness),
            self.hole_count,
            stem_number(self.hole_diameter),
            stem_number(self.center_hole_diameter),
            stem_number(self.bolt_circle_diameter),
        )
    }
}

/// Render a length with at most three decimals, using `p` for the point
fn stem_number(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.replace('.', "p")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn example_spec() -> FlangeSpec {
        FlangeSpec {
            flange_diameter: Some(50.0),
            flange_thickness: Some(8.0),
            hole_count: Some(6),
            hole_diameter: Some(5.5),
            center_hole_diameter: Some(12.0),
            output_format: Some("STEP".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_example_parameters() {
        let params = example_spec().validate().unwrap();
        assert_eq!(params.hole_count(), 6);
        assert_eq!(params.output_format(), OutputFormat::Step);
        assert_relative_eq!(params.bolt_circle_diameter(), 40.0);
        assert!(params.has_center_hole());
    }

    #[test]
    fn test_empty_spec_matches_defaults() {
        let params = FlangeSpec::default().validate().unwrap();
        assert_eq!(params, FlangeParams::default());
    }

    #[test]
    fn test_structural_equality() {
        let a = example_spec().validate().unwrap();
        let b = FlangeParams::try_from(example_spec()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, a.with_output_format(OutputFormat::Stl));
    }

    #[test]
    fn test_hole_diameter_not_less_than_flange() {
        let spec = FlangeSpec {
            hole_diameter: Some(50.0),
            ..example_spec()
        };
        let err = spec.validate().unwrap_err();
        assert_eq!(err.field, "hole_diameter");
        assert!(
            err.to_string()
                .starts_with("hole_diameter must be less than flange_diameter")
        );
    }

    #[test]
    fn test_center_hole_not_less_than_flange() {
        let spec = FlangeSpec {
            center_hole_diameter: Some(60.0),
            ..example_spec()
        };
        let err = spec.validate().unwrap_err();
        assert_eq!(err.field, "center_hole_diameter");
    }

    #[test]
    fn test_negative_thickness() {
        let spec = FlangeSpec {
            flange_thickness: Some(-1.0),
            ..example_spec()
        };
        assert_eq!(spec.validate().unwrap_err().field, "flange_thickness");
    }

    #[test]
    fn test_non_finite_diameter() {
        let spec = FlangeSpec {
            flange_diameter: Some(f64::INFINITY),
            ..example_spec()
        };
        assert_eq!(spec.validate().unwrap_err().field, "flange_diameter");
    }

    #[test]
    fn test_negative_hole_count() {
        let spec = FlangeSpec {
            hole_count: Some(-2),
            ..example_spec()
        };
        let err = spec.validate().unwrap_err();
        assert_eq!(err.field, "hole_count");
    }

    #[test]
    fn test_zero_holes_and_no_bore_are_valid() {
        let spec = FlangeSpec {
            hole_count: Some(0),
            center_hole_diameter: Some(0.0),
            ..example_spec()
        };
        let params = spec.validate().unwrap();
        assert_eq!(params.hole_count(), 0);
        assert!(!params.has_center_hole());
    }

    #[test]
    fn test_bolt_circle_too_large() {
        let spec = FlangeSpec {
            bolt_circle_diameter: Some(46.0),
            ..example_spec()
        };
        assert_eq!(spec.validate().unwrap_err().field, "bolt_circle_diameter");
    }

    #[test]
    fn test_bolt_circle_ratio() {
        let spec = FlangeSpec {
            bolt_circle_ratio: Some(0.65),
            ..example_spec()
        };
        assert_relative_eq!(spec.validate().unwrap().bolt_circle_diameter(), 32.5);

        let spec = FlangeSpec {
            bolt_circle_ratio: Some(0.95),
            ..example_spec()
        };
        assert_eq!(spec.validate().unwrap_err().field, "bolt_circle_ratio");
    }

    #[test]
    fn test_explicit_bolt_circle_wins_over_ratio() {
        let spec = FlangeSpec {
            bolt_circle_diameter: Some(30.0),
            bolt_circle_ratio: Some(0.5),
            ..example_spec()
        };
        assert_relative_eq!(spec.validate().unwrap().bolt_circle_diameter(), 30.0);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("step".parse::<OutputFormat>().unwrap(), OutputFormat::Step);
        assert_eq!("STP".parse::<OutputFormat>().unwrap(), OutputFormat::Step);
        assert_eq!(" stl ".parse::<OutputFormat>().unwrap(), OutputFormat::Stl);

        let spec = FlangeSpec {
            output_format: Some("OBJ".into()),
            ..example_spec()
        };
        assert_eq!(spec.validate().unwrap_err().field, "output_format");
    }

    #[test]
    fn test_spec_round_trips_through_params() {
        let params = example_spec().validate().unwrap();
        let spec = FlangeSpec::from(&params);
        assert_eq!(spec.validate().unwrap(), params);
    }

    #[test]
    fn test_deserialize_legacy_parameter_names() {
        let spec: FlangeSpec = serde_json::from_str(
            r#"{"flange_diameter": 75.0, "hole_count": 8,
                "bolt_circle_percentage": 0.7, "chamfer_size": 2.0}"#,
        )
        .unwrap();
        assert_eq!(spec.bolt_circle_ratio, Some(0.7));
        assert_eq!(spec.flange_thickness, None);
    }

    #[test]
    fn test_file_stem() {
        let params = example_spec().validate().unwrap();
        assert_eq!(params.file_stem(), "flange_d50_t8_n6_h5p5_c12_b40");
        assert_eq!(stem_number(12.3456), "12p346");
        assert_eq!(stem_number(0.0), "0");
    }
}
