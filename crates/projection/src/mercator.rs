//! Spherical Web Mercator (EPSG:3857).
//!
//! Geographic coordinates are (longitude, latitude) in degrees; projected
//! coordinates are (easting, northing) in meters on a sphere of radius
//! 6378137 m. Latitudes are clamped to the square-world limit.

use std::f64::consts::PI;
use std::sync::Arc;

use raster_common::Crs;

use crate::error::ProjectionResult;
use crate::operation::CoordinateOperation;

/// Semi-major axis of WGS84, used as the sphere radius.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude where the projected world becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Direction of a [`WebMercator`] operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Geographic degrees to projected meters.
    Forward,
    /// Projected meters to geographic degrees.
    Inverse,
}

#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    geographic: Crs,
    direction: Direction,
}

impl WebMercator {
    /// Geographic (`geographic` CRS) to EPSG:3857.
    pub fn forward(geographic: Crs) -> Self {
        Self {
            geographic,
            direction: Direction::Forward,
        }
    }

    /// EPSG:3857 to geographic (`geographic` CRS).
    pub fn inverse_of(geographic: Crs) -> Self {
        Self {
            geographic,
            direction: Direction::Inverse,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Project longitude/latitude degrees to meters.
pub fn project(lon: f64, lat: f64) -> Option<(f64, f64)> {
    if !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    Some((x, y))
}

/// Unproject meters to longitude/latitude degrees.
pub fn unproject(x: f64, y: f64) -> Option<(f64, f64)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    Some((lon, lat))
}

impl CoordinateOperation for WebMercator {
    fn source_crs(&self) -> Crs {
        match self.direction {
            Direction::Forward => self.geographic,
            Direction::Inverse => Crs::web_mercator(),
        }
    }

    fn target_crs(&self) -> Crs {
        match self.direction {
            Direction::Forward => Crs::web_mercator(),
            Direction::Inverse => self.geographic,
        }
    }

    fn transform(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self.direction {
            Direction::Forward => project(x, y),
            Direction::Inverse => unproject(x, y),
        }
    }

    fn inverse(&self) -> ProjectionResult<Arc<dyn CoordinateOperation>> {
        Ok(Arc::new(match self.direction {
            Direction::Forward => WebMercator::inverse_of(self.geographic),
            Direction::Inverse => WebMercator::forward(self.geographic),
        }))
    }
}
