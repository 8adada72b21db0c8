//! Configuration for tile aggregation.

use serde::{Deserialize, Serialize};

use crate::error::{MosaicError, Result};
use crate::types::InterpolationMethod;

/// Tunables shared by the aggregated and mosaicked resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Margin in tile pixels added around each per-tile read window of an
    /// aggregated read, giving the resampler context at tile edges.
    pub aggregate_margin: i64,

    /// Margin in pixels added around the working grid of a mosaicked read.
    pub mosaic_margin: i64,

    /// Kernel used when compositing heterogeneous tiles.
    pub aggregate_interpolation: InterpolationMethod,

    /// Kernel used when compositing tiles sharing one grid.
    pub mosaic_interpolation: InterpolationMethod,

    /// Points sampled per edge when reprojecting an envelope.
    pub envelope_densify: usize,

    /// Largest group footprint (in pixels) validated with a bit grid.
    pub footprint_check_limit: u64,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            aggregate_margin: 5,
            mosaic_margin: 3,
            aggregate_interpolation: InterpolationMethod::Bilinear,
            mosaic_interpolation: InterpolationMethod::Nearest,
            envelope_densify: 16,
            footprint_check_limit: 1 << 26,
        }
    }
}

impl MosaicConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MOSAIC_AGGREGATE_MARGIN") {
            if let Ok(margin) = val.parse() {
                config.aggregate_margin = margin;
            }
        }

        if let Ok(val) = std::env::var("MOSAIC_MARGIN") {
            if let Ok(margin) = val.parse() {
                config.mosaic_margin = margin;
            }
        }

        if let Ok(val) = std::env::var("MOSAIC_AGGREGATE_INTERPOLATION") {
            config.aggregate_interpolation = InterpolationMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("MOSAIC_INTERPOLATION") {
            config.mosaic_interpolation = InterpolationMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("MOSAIC_ENVELOPE_DENSIFY") {
            if let Ok(points) = val.parse() {
                config.envelope_densify = points;
            }
        }

        if let Ok(val) = std::env::var("MOSAIC_FOOTPRINT_CHECK_LIMIT") {
            if let Ok(limit) = val.parse() {
                config.footprint_check_limit = limit;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.aggregate_margin < 0 || self.mosaic_margin < 0 {
            return Err(MosaicError::Config("margins must be >= 0".to_string()));
        }

        if self.envelope_densify < 2 {
            return Err(MosaicError::Config("envelope_densify must be >= 2".to_string()));
        }

        if self.footprint_check_limit == 0 {
            return Err(MosaicError::Config("footprint_check_limit must be > 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MosaicConfig::default();
        assert_eq!(config.aggregate_margin, 5);
        assert_eq!(config.mosaic_margin, 3);
        assert_eq!(config.aggregate_interpolation, InterpolationMethod::Bilinear);
        assert_eq!(config.mosaic_interpolation, InterpolationMethod::Nearest);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = MosaicConfig {
            envelope_densify: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MosaicError::Config(_))));

        let config = MosaicConfig {
            mosaic_margin: -1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MosaicConfig =
            serde_json::from_str(r#"{ "mosaic_margin": 1, "aggregate_interpolation": "Nearest" }"#).unwrap();
        assert_eq!(config.mosaic_margin, 1);
        assert_eq!(config.aggregate_margin, 5);
        assert_eq!(config.aggregate_interpolation, InterpolationMethod::Nearest);
    }
}
