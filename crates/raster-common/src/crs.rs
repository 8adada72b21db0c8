//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// CRS codes known to the engine.
///
/// The named variants are the systems the standard operation factory knows
/// how to relate; any other EPSG code is carried as [`CrsCode::Epsg`] and can
/// only be related through registered operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// NAD83 Geographic
    Epsg4269,
    /// CONUS Albers Equal Area
    Epsg5070,
    /// Polar Stereographic North
    Epsg3413,
    /// Polar Stereographic South
    Epsg3031,
    /// Any other EPSG code.
    Epsg(u32),
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => return Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => return Ok(CrsCode::Epsg3857),
            _ => {}
        }

        let code = normalized
            .strip_prefix("EPSG:")
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        Ok(Self::from_epsg(code))
    }

    /// Map a numeric EPSG code onto its named variant when there is one.
    pub fn from_epsg(code: u32) -> Self {
        match code {
            4326 => CrsCode::Epsg4326,
            3857 => CrsCode::Epsg3857,
            4269 => CrsCode::Epsg4269,
            5070 => CrsCode::Epsg5070,
            3413 => CrsCode::Epsg3413,
            3031 => CrsCode::Epsg3031,
            other => CrsCode::Epsg(other),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg5070 => 5070,
            CrsCode::Epsg3413 => 3413,
            CrsCode::Epsg3031 => 3031,
            CrsCode::Epsg(code) => *code,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// A two-dimensional coordinate reference system.
///
/// Grid geometries carry one of these; two geometries share a CRS when their
/// codes are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub code: CrsCode,
}

impl Crs {
    pub fn new(code: CrsCode) -> Self {
        Self { code }
    }

    /// WGS84 geographic coordinates.
    pub fn wgs84() -> Self {
        Self::new(CrsCode::Epsg4326)
    }

    /// Spherical Web Mercator.
    pub fn web_mercator() -> Self {
        Self::new(CrsCode::Epsg3857)
    }

    /// Any EPSG code.
    pub fn epsg(code: u32) -> Self {
        Self::new(CrsCode::from_epsg(code))
    }

    /// Number of coordinate axes. Only planar systems are supported.
    pub fn dimension(&self) -> usize {
        2
    }

    pub fn is_geographic(&self) -> bool {
        self.code.is_geographic()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.code.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("epsg:3857").unwrap(), CrsCode::Epsg3857);
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("EPSG:32633").unwrap(), CrsCode::Epsg(32633));
        assert!(CrsCode::parse("OGC:FOO").is_err());
    }

    #[test]
    fn test_named_codes_normalize() {
        assert_eq!(CrsCode::from_epsg(5070), CrsCode::Epsg5070);
        assert_eq!(Crs::epsg(4326), Crs::wgs84());
        assert_eq!(Crs::epsg(32633).to_string(), "EPSG:32633");
    }
}
