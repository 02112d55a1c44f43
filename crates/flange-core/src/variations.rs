//! Parameter variations for dataset generation
//!
//! Both generators produce raw [`FlangeSpec`] records. Random samples are not
//! guaranteed to be buildable; the batch driver reports the ones that are
//! not.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::constants::BOLT_CIRCLE_RATIO_RANGE;
use crate::params::FlangeSpec;

/// Hole counts swept by [`systematic_variations`]
pub const SYSTEMATIC_HOLE_COUNTS: [i64; 5] = [3, 4, 6, 8, 12];

/// Inclusive range of a sampled value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn check(&self, field: &str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::InvalidRanges(format!(
                "{field}: [{}, {}] is not a valid range",
                self.min, self.max
            )));
        }
        Ok(())
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        round_hundredths(rng.gen_range(self.min..=self.max))
    }
}

/// Where random variations are drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingRanges {
    pub flange_diameter: ValueRange,
    pub flange_thickness: ValueRange,
    /// Picked uniformly from this list
    pub hole_counts: Vec<i64>,
    pub hole_diameter: ValueRange,
    pub center_hole_diameter: ValueRange,
    pub bolt_circle_ratio: ValueRange,
}

impl Default for SamplingRanges {
    fn default() -> Self {
        Self {
            flange_diameter: ValueRange::new(30.0, 100.0),
            flange_thickness: ValueRange::new(5.0, 20.0),
            hole_counts: vec![4, 6, 8, 12],
            hole_diameter: ValueRange::new(3.0, 12.0),
            center_hole_diameter: ValueRange::new(8.0, 25.0),
            bolt_circle_ratio: ValueRange::new(0.5, 0.75),
        }
    }
}

impl SamplingRanges {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.flange_diameter.check("flange_diameter")?;
        self.flange_thickness.check("flange_thickness")?;
        self.hole_diameter.check("hole_diameter")?;
        self.center_hole_diameter.check("center_hole_diameter")?;
        self.bolt_circle_ratio.check("bolt_circle_ratio")?;

        let (lo, hi) = BOLT_CIRCLE_RATIO_RANGE;
        if self.bolt_circle_ratio.min < lo || self.bolt_circle_ratio.max > hi {
            return Err(ConfigError::InvalidRanges(format!(
                "bolt_circle_ratio must stay within [{lo}, {hi}]"
            )));
        }
        if self.hole_counts.is_empty() {
            return Err(ConfigError::InvalidRanges(
                "hole_counts must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Draw `count` random records
///
/// The same `seed` always gives the same records. Without a seed the
/// generator is seeded from the OS.
pub fn random_variations(
    count: usize,
    ranges: &SamplingRanges,
    seed: Option<u64>,
) -> Result<Vec<FlangeSpec>, ConfigError> {
    ranges.validate()?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let specs = (0..count)
        .map(|_| {
            let flange_diameter = ranges.flange_diameter.sample(&mut rng);
            let flange_thickness = ranges.flange_thickness.sample(&mut rng);
            let hole_count = ranges.hole_counts.choose(&mut rng).copied();
            let hole_diameter = ranges.hole_diameter.sample(&mut rng);
            let center_hole_diameter = ranges.center_hole_diameter.sample(&mut rng);
            let bolt_circle_ratio = ranges.bolt_circle_ratio.sample(&mut rng);
            FlangeSpec {
                flange_diameter: Some(flange_diameter),
                flange_thickness: Some(flange_thickness),
                hole_count,
                hole_diameter: Some(hole_diameter),
                center_hole_diameter: Some(center_hole_diameter),
                bolt_circle_ratio: Some(bolt_circle_ratio),
                ..Default::default()
            }
        })
        .collect();

    tracing::debug!(count, ?seed, "random variations drawn");
    Ok(specs)
}

/// The default flange with the hole count swept over [`SYSTEMATIC_HOLE_COUNTS`]
///
/// Hole diameter is `min(6, flange_diameter / 10)` for every record.
pub fn systematic_variations() -> Vec<FlangeSpec> {
    let base = crate::params::FlangeParams::default();
    let hole_diameter = (base.flange_diameter() * 0.1).min(6.0);

    SYSTEMATIC_HOLE_COUNTS
        .iter()
        .map(|&hole_count| FlangeSpec {
            hole_count: Some(hole_count),
            hole_diameter: Some(hole_diameter),
            ..FlangeSpec::from(&base)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let ranges = SamplingRanges::default();
        let a = random_variations(20, &ranges, Some(42)).unwrap();
        let b = random_variations(20, &ranges, Some(42)).unwrap();
        let c = random_variations(20, &ranges, Some(43)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_samples_stay_in_range() {
        let ranges = SamplingRanges::default();
        for spec in random_variations(200, &ranges, Some(7)).unwrap() {
            let d = spec.flange_diameter.unwrap();
            assert!((30.0..=100.0).contains(&d));
            assert!((5.0..=20.0).contains(&spec.flange_thickness.unwrap()));
            assert!([4, 6, 8, 12].contains(&spec.hole_count.unwrap()));
            assert!((3.0..=12.0).contains(&spec.hole_diameter.unwrap()));
            assert!((8.0..=25.0).contains(&spec.center_hole_diameter.unwrap()));
            assert!((0.5..=0.75).contains(&spec.bolt_circle_ratio.unwrap()));
            assert_eq!(round_hundredths(d), d);
            assert!(spec.bolt_circle_diameter.is_none());
        }
    }

    #[test]
    fn test_degenerate_range_is_fixed_value() {
        let ranges = SamplingRanges {
            flange_diameter: ValueRange::new(60.0, 60.0),
            hole_counts: vec![8],
            ..Default::default()
        };
        for spec in random_variations(5, &ranges, Some(1)).unwrap() {
            assert_eq!(spec.flange_diameter, Some(60.0));
            assert_eq!(spec.hole_count, Some(8));
        }
    }

    #[test]
    fn test_invalid_ranges_are_rejected() {
        let inverted = SamplingRanges {
            hole_diameter: ValueRange::new(12.0, 3.0),
            ..Default::default()
        };
        assert!(matches!(
            random_variations(1, &inverted, Some(1)),
            Err(ConfigError::InvalidRanges(_))
        ));

        let no_counts = SamplingRanges {
            hole_counts: Vec::new(),
            ..Default::default()
        };
        assert!(no_counts.validate().is_err());

        let wide_ratio = SamplingRanges {
            bolt_circle_ratio: ValueRange::new(0.05, 0.95),
            ..Default::default()
        };
        assert!(wide_ratio.validate().is_err());
    }

    #[test]
    fn test_zero_count() {
        let specs = random_variations(0, &SamplingRanges::default(), None).unwrap();
        assert!(specs.is_empty());
    }

    #[test]
    fn test_systematic_variations() {
        let specs = systematic_variations();
        let counts: Vec<_> = specs.iter().map(|s| s.hole_count.unwrap()).collect();
        assert_eq!(counts, SYSTEMATIC_HOLE_COUNTS);

        for spec in &specs {
            assert_eq!(spec.hole_diameter, Some(5.0));
            assert_eq!(spec.flange_diameter, Some(50.0));
            assert!(spec.validate().is_ok());
        }
    }
}
