//! Band descriptions.

use serde::{Deserialize, Serialize};

/// Semantics of one band: name, no-data marker, valid range and unit.
///
/// Carried through reads unchanged; no unit conversion happens anywhere in
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDimension {
    pub name: String,
    /// Packed value standing for "no data", replaced by NaN in converted reads.
    pub fill_value: Option<f64>,
    /// Valid value range (min, max).
    pub range: Option<(f64, f64)>,
    pub unit: Option<String>,
}

impl SampleDimension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fill_value: None,
            range: None,
            unit: None,
        }
    }

    pub fn with_fill_value(mut self, fill: f64) -> Self {
        self.fill_value = Some(fill);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// True when `value` is this band's fill marker.
    pub fn is_fill(&self, value: f32) -> bool {
        match self.fill_value {
            Some(fill) => (value as f64 - fill).abs() < f64::EPSILON || (fill.is_nan() && value.is_nan()),
            None => false,
        }
    }
}
