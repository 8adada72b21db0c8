//! Grid geometries: pixel extent + grid-to-space transform + CRS.
//!
//! Grid coordinates are pixel *centres*: pixel `(i, j)` covers the continuous
//! grid range `[i - 0.5, i + 0.5) × [j - 0.5, j + 0.5)`, and the
//! grid-to-space transform maps `(i, j)` to the georeferenced position of
//! that pixel's centre.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, GeometryResult};
use crate::{Crs, Envelope};

/// Tolerance applied when snapping continuous grid coordinates to pixels.
const SNAP_EPSILON: f64 = 1e-9;

/// Inclusive integer pixel bounds of a two-dimensional grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridExtent {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl GridExtent {
    /// Create an extent from inclusive bounds.
    pub fn new(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> GeometryResult<Self> {
        if x_max < x_min || y_max < y_min {
            return Err(GeometryError::InvalidExtent(format!(
                "[{x_min}..{x_max}, {y_min}..{y_max}]"
            )));
        }
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Extent `[0, width) × [0, height)`.
    pub fn from_size(width: usize, height: usize) -> GeometryResult<Self> {
        Self::new(0, 0, width as i64 - 1, height as i64 - 1)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        (self.x_max - self.x_min + 1) as usize
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        (self.y_max - self.y_min + 1) as usize
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width() * self.height()
    }

    /// An extent always holds at least one pixel.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Pixels shared by both extents.
    pub fn intersection(&self, other: &GridExtent) -> Option<GridExtent> {
        GridExtent::new(
            self.x_min.max(other.x_min),
            self.y_min.max(other.y_min),
            self.x_max.min(other.x_max),
            self.y_max.min(other.y_max),
        )
        .ok()
    }

    /// Smallest extent holding both extents.
    pub fn union(&self, other: &GridExtent) -> GridExtent {
        GridExtent {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Grow by `margin` pixels on every side.
    pub fn expand(&self, margin: i64) -> GridExtent {
        GridExtent {
            x_min: self.x_min - margin,
            y_min: self.y_min - margin,
            x_max: self.x_max + margin,
            y_max: self.y_max + margin,
        }
    }

    pub fn translate(&self, dx: i64, dy: i64) -> GridExtent {
        GridExtent {
            x_min: self.x_min + dx,
            y_min: self.y_min + dy,
            x_max: self.x_max + dx,
            y_max: self.y_max + dy,
        }
    }
}

/// Two-dimensional affine transform.
///
/// `x' = a·x + b·y + c` and `y' = d·x + e·y + f`, stored as `[a, b, c, d, e, f]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub coefficients: [f64; 6],
}

impl AffineTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            coefficients: [a, b, c, d, e, f],
        }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// North-up transform for a grid whose upper-left pixel *corner* sits at
    /// `(min_x, max_y)` with square-ish cells of `res_x` by `res_y`.
    pub fn north_up(min_x: f64, max_y: f64, res_x: f64, res_y: f64) -> Self {
        Self::new(
            res_x,
            0.0,
            min_x + 0.5 * res_x,
            0.0,
            -res_y,
            max_y - 0.5 * res_y,
        )
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, dx, 0.0, 1.0, dy)
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.coefficients;
        (a * x + b * y + c, d * x + e * y + f)
    }

    pub fn to_matrix(&self) -> Matrix3<f64> {
        let [a, b, c, d, e, f] = self.coefficients;
        Matrix3::new(a, b, c, d, e, f, 0.0, 0.0, 1.0)
    }

    pub fn from_matrix(m: &Matrix3<f64>) -> Self {
        Self::new(m[(0, 0)], m[(0, 1)], m[(0, 2)], m[(1, 0)], m[(1, 1)], m[(1, 2)])
    }

    pub fn inverse(&self) -> GeometryResult<AffineTransform> {
        self.to_matrix()
            .try_inverse()
            .map(|m| Self::from_matrix(&m))
            .ok_or(GeometryError::SingularTransform)
    }

    /// Transform that applies `self` first, then `next`.
    pub fn then(&self, next: &AffineTransform) -> AffineTransform {
        Self::from_matrix(&(next.to_matrix() * self.to_matrix()))
    }

    /// Transform that shifts grid coordinates by `(dx, dy)` before applying `self`.
    pub fn translated(&self, dx: f64, dy: f64) -> AffineTransform {
        AffineTransform::translation(dx, dy).then(self)
    }

    /// True when both transforms share scale, rotation and shear.
    pub fn linear_part_eq(&self, other: &AffineTransform, tolerance: f64) -> bool {
        let [a0, b0, _, d0, e0, _] = self.coefficients;
        let [a1, b1, _, d1, e1, _] = other.coefficients;
        (a0 - a1).abs() <= tolerance
            && (b0 - b1).abs() <= tolerance
            && (d0 - d1).abs() <= tolerance
            && (e0 - e1).abs() <= tolerance
    }

    /// Cell size along the grid axes, in space units.
    pub fn resolution(&self) -> (f64, f64) {
        let [a, b, _, d, e, _] = self.coefficients;
        ((a * a + d * d).sqrt(), (b * b + e * e).sqrt())
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Sampling domain of a raster.
///
/// The extent is optional: a geometry may describe only how grid
/// coordinates map to space without declaring which pixels exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub extent: Option<GridExtent>,
    pub transform: AffineTransform,
    pub crs: Crs,
}

impl GridGeometry {
    pub fn new(extent: GridExtent, transform: AffineTransform, crs: Crs) -> Self {
        Self {
            extent: Some(extent),
            transform,
            crs,
        }
    }

    /// A geometry declaring no pixel extent.
    pub fn unbounded(transform: AffineTransform, crs: Crs) -> Self {
        Self {
            extent: None,
            transform,
            crs,
        }
    }

    /// North-up grid of `width × height` cells covering `envelope`.
    pub fn north_up(envelope: &Envelope, width: usize, height: usize, crs: Crs) -> GeometryResult<Self> {
        let extent = GridExtent::from_size(width, height)?;
        let transform = AffineTransform::north_up(
            envelope.min_x,
            envelope.max_y,
            envelope.width() / width as f64,
            envelope.height() / height as f64,
        );
        Ok(Self::new(extent, transform, crs))
    }

    pub fn extent(&self) -> GeometryResult<&GridExtent> {
        self.extent.as_ref().ok_or(GeometryError::UndefinedExtent)
    }

    pub fn width(&self) -> usize {
        self.extent.map(|e| e.width()).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.extent.map(|e| e.height()).unwrap_or(0)
    }

    /// Same transform and CRS, different pixels.
    pub fn with_extent(&self, extent: GridExtent) -> GridGeometry {
        GridGeometry {
            extent: Some(extent),
            transform: self.transform,
            crs: self.crs,
        }
    }

    /// Georeferenced bounds of the extent, measured at pixel edges.
    pub fn envelope(&self) -> Option<Envelope> {
        let extent = self.extent?;
        let corners = [
            (extent.x_min as f64 - 0.5, extent.y_min as f64 - 0.5),
            (extent.x_max as f64 + 0.5, extent.y_min as f64 - 0.5),
            (extent.x_max as f64 + 0.5, extent.y_max as f64 + 0.5),
            (extent.x_min as f64 - 0.5, extent.y_max as f64 + 0.5),
        ];
        Envelope::from_points(corners.iter().map(|&(x, y)| self.transform.apply(x, y)))
    }

    /// Translate the extent so its lower bound is zero.
    ///
    /// The transform is adjusted so every pixel keeps its georeferenced position.
    pub fn normalized(&self) -> GridGeometry {
        match self.extent {
            Some(extent) if extent.x_min != 0 || extent.y_min != 0 => GridGeometry {
                extent: Some(extent.translate(-extent.x_min, -extent.y_min)),
                transform: self
                    .transform
                    .translated(extent.x_min as f64, extent.y_min as f64),
                crs: self.crs,
            },
            _ => self.clone(),
        }
    }

    /// Pixels touched by `area` (expressed in this geometry's CRS), with
    /// enclosing rounding. Not clipped to the extent.
    pub fn grid_range(&self, area: &Envelope) -> GeometryResult<Option<GridExtent>> {
        let inverse = self.transform.inverse()?;
        let bounds = Envelope::from_points(area.corners().iter().map(|&(x, y)| inverse.apply(x, y)));
        let Some(bounds) = bounds else {
            return Ok(None);
        };

        let lo_x = (bounds.min_x + 0.5 + SNAP_EPSILON).floor() as i64;
        let lo_y = (bounds.min_y + 0.5 + SNAP_EPSILON).floor() as i64;
        let hi_x = (bounds.max_x + 0.5 - SNAP_EPSILON).ceil() as i64 - 1;
        let hi_y = (bounds.max_y + 0.5 - SNAP_EPSILON).ceil() as i64 - 1;

        Ok(GridExtent::new(lo_x, lo_y, hi_x, hi_y).ok())
    }

    /// Sub-grid of this geometry covering `area`, grown by `margin` pixels
    /// and clipped to the extent.
    ///
    /// Returns `None` when `area` does not touch any pixel of the extent.
    pub fn subgrid(&self, area: &Envelope, margin: i64) -> GeometryResult<Option<GridGeometry>> {
        let extent = *self.extent()?;
        let Some(range) = self.grid_range(area)? else {
            return Ok(None);
        };
        let Some(inside) = range.intersection(&extent) else {
            return Ok(None);
        };
        let grown = inside.expand(margin).intersection(&extent).unwrap_or(inside);
        Ok(Some(self.with_extent(grown)))
    }
}
