// THEORY:
// Every tunable of the detector lives in a single `DetectorConfig` value that is
// handed to each stage explicitly. Nothing in the crate reads process-wide
// settings, so several color-family passes (or several detectors with different
// settings) can run at the same time without stepping on each other.
//
// The config is plain data: it derives serde so the harness can load it from a
// JSON file, and every field has a default matching the values the detector was
// tuned with. `#[serde(default)]` lets a file override only the fields it names.

use crate::core_modules::color_range::{ColorFamily, ColorTable};
use crate::core_modules::region_extractor::Connectivity;
use crate::error::{DetectionError, Result};
use serde::{Deserialize, Serialize};

/// Shape of the structuring element used for morphological closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructuringShape {
    Rectangle,
    Cross,
    Ellipse,
}

/// Largest closing radius imageproc's morphology masks can hold (511 px across).
pub const MAX_CLOSING_RADIUS: u32 = 255;

/// Settings for the closing applied to the combined base+strip mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyConfig {
    pub shape: StructuringShape,
    /// Half-size of the element; the kernel is `2 * radius + 1` pixels wide.
    pub radius: u32,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            shape: StructuringShape::Ellipse,
            radius: 2,
        }
    }
}

/// Configuration for the cone detector, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Upper bound on the number of regions promoted to candidates per color family.
    pub max_candidates: usize,
    /// A box covering this fraction of the operating zone (or more) is too large
    /// to be a cone. Applied to raw regions and again to cluster boxes.
    pub max_cone_area_fraction: f64,
    /// Candidate boxes are widened by this factor (centered).
    pub inflation_factor: f64,
    /// Vertical growth relative to the horizontal one. The extra height is added
    /// above the box only; the bottom edge never moves.
    pub upward_growth_ratio: f64,
    /// Cluster boxes flatter than this height/width ratio are dropped.
    pub cluster_min_aspect: f64,
    /// Dark strip regions flatter than this height/width ratio are treated as shadows.
    pub shadow_max_aspect: f64,
    /// Minimum height/width of the hull's base for the cone shape test.
    pub cone_min_aspect: f64,
    pub closing: MorphologyConfig,
    /// Fraction of the frame height removed from the top before detection.
    pub operating_zone_top_fraction: f64,
    pub connectivity: Connectivity,
    pub families: Vec<ColorFamily>,
    pub color_table: ColorTable,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            max_cone_area_fraction: 0.07,
            inflation_factor: 2.0,
            upward_growth_ratio: 1.5,
            cluster_min_aspect: 0.5,
            shadow_max_aspect: 0.7,
            cone_min_aspect: 0.9,
            closing: MorphologyConfig::default(),
            operating_zone_top_fraction: 0.25,
            connectivity: Connectivity::Eight,
            families: ColorFamily::defaults(),
            color_table: ColorTable::default(),
        }
    }
}

impl DetectorConfig {
    /// Parses a (possibly partial) JSON config and validates it.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| DetectionError::Config(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_candidates == 0 {
            return Err(DetectionError::Config(
                "max_candidates must be at least 1".to_string(),
            ));
        }
        if !(self.max_cone_area_fraction > 0.0 && self.max_cone_area_fraction <= 1.0) {
            return Err(DetectionError::Config(format!(
                "max_cone_area_fraction must be in (0, 1], got {}",
                self.max_cone_area_fraction
            )));
        }
        if !(self.inflation_factor >= 1.0 && self.inflation_factor.is_finite()) {
            return Err(DetectionError::Config(format!(
                "inflation_factor must be a finite value >= 1, got {}",
                self.inflation_factor
            )));
        }
        if !(self.operating_zone_top_fraction >= 0.0 && self.operating_zone_top_fraction < 1.0) {
            return Err(DetectionError::Config(format!(
                "operating_zone_top_fraction must be in [0, 1), got {}",
                self.operating_zone_top_fraction
            )));
        }

        if self.closing.radius > MAX_CLOSING_RADIUS {
            return Err(DetectionError::Config(format!(
                "closing.radius must be at most {MAX_CLOSING_RADIUS}, got {}",
                self.closing.radius
            )));
        }

        let ratios = [
            ("upward_growth_ratio", self.upward_growth_ratio),
            ("cluster_min_aspect", self.cluster_min_aspect),
            ("shadow_max_aspect", self.shadow_max_aspect),
            ("cone_min_aspect", self.cone_min_aspect),
        ];
        for (name, value) in ratios {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(DetectionError::Config(format!(
                    "{name} must be a finite, non-negative value, got {value}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_range::ColorId;

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_candidates, 10);
        assert_eq!(config.families.len(), 3);
        assert_eq!(config.closing.shape, StructuringShape::Ellipse);
    }

    #[test]
    fn test_rejects_zero_candidates() {
        let config = DetectorConfig {
            max_candidates: 0,
            ..DetectorConfig::default()
        };
        assert!(matches!(config.validate(), Err(DetectionError::Config(_))));
    }

    #[test]
    fn test_rejects_out_of_range_fractions() {
        let config = DetectorConfig {
            max_cone_area_fraction: 0.0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            operating_zone_top_fraction: 1.0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            inflation_factor: 0.5,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            shadow_max_aspect: f64::NAN,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = DetectorConfig::from_json(
            r#"{ "max_candidates": 4, "closing": { "radius": 3 } }"#,
        )
        .unwrap();
        assert_eq!(config.max_candidates, 4);
        assert_eq!(config.closing.radius, 3);
        assert_eq!(config.closing.shape, StructuringShape::Ellipse);
        assert_eq!(config.inflation_factor, 2.0);
    }

    #[test]
    fn test_rejects_oversized_closing_radius() {
        let mut config = DetectorConfig::default();
        config.closing.radius = MAX_CLOSING_RADIUS;
        assert!(config.validate().is_ok());
        config.closing.radius = MAX_CLOSING_RADIUS + 1;
        assert!(matches!(config.validate(), Err(DetectionError::Config(msg)) if msg.contains("closing.radius")));
    }

    #[test]
    fn test_json_families() {
        let config = DetectorConfig::from_json(
            r#"{ "families": [ { "base": "orange", "strip": "white" } ] }"#,
        )
        .unwrap();
        assert_eq!(config.families.len(), 1);
        assert_eq!(config.families[0].base, ColorId::Orange);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = DetectorConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, DetectionError::Config(_)));
    }

    #[test]
    fn test_invalid_values_in_json_are_rejected() {
        assert!(DetectorConfig::from_json(r#"{ "max_candidates": 0 }"#).is_err());
    }
}
