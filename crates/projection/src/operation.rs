//! Coordinate operations between two reference systems.

use std::fmt::Debug;
use std::sync::Arc;

use raster_common::{AffineTransform, Crs};

use crate::error::{ProjectionError, ProjectionResult};

/// A point-wise mapping from one CRS to another.
///
/// `transform` returns `None` for points outside the operation's domain
/// (for example latitudes a Mercator projection cannot represent).
pub trait CoordinateOperation: Send + Sync + Debug {
    fn source_crs(&self) -> Crs;

    fn target_crs(&self) -> Crs;

    fn transform(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// The operation mapping target coordinates back to source coordinates.
    fn inverse(&self) -> ProjectionResult<Arc<dyn CoordinateOperation>>;

    /// True when `transform` returns its input unchanged.
    fn is_identity(&self) -> bool {
        false
    }

    /// The operation as an affine transform, when it is one.
    fn as_affine(&self) -> Option<AffineTransform> {
        None
    }
}

/// Operation between two reference systems whose coordinates are interchangeable.
#[derive(Debug, Clone, Copy)]
pub struct IdentityOperation {
    source: Crs,
    target: Crs,
}

impl IdentityOperation {
    pub fn new(source: Crs, target: Crs) -> Self {
        Self { source, target }
    }

    pub fn same(crs: Crs) -> Self {
        Self::new(crs, crs)
    }
}

impl CoordinateOperation for IdentityOperation {
    fn source_crs(&self) -> Crs {
        self.source
    }

    fn target_crs(&self) -> Crs {
        self.target
    }

    #[inline]
    fn transform(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some((x, y))
    }

    fn inverse(&self) -> ProjectionResult<Arc<dyn CoordinateOperation>> {
        Ok(Arc::new(IdentityOperation::new(self.target, self.source)))
    }

    fn is_identity(&self) -> bool {
        true
    }

    fn as_affine(&self) -> Option<AffineTransform> {
        Some(AffineTransform::identity())
    }
}

/// Linear operation between two reference systems, e.g. a local engineering
/// grid shifted and scaled against a projected system.
#[derive(Debug, Clone, Copy)]
pub struct AffineOperation {
    source: Crs,
    target: Crs,
    transform: AffineTransform,
}

impl AffineOperation {
    pub fn new(source: Crs, target: Crs, transform: AffineTransform) -> Self {
        Self {
            source,
            target,
            transform,
        }
    }
}

impl CoordinateOperation for AffineOperation {
    fn source_crs(&self) -> Crs {
        self.source
    }

    fn target_crs(&self) -> Crs {
        self.target
    }

    #[inline]
    fn transform(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some(self.transform.apply(x, y))
    }

    fn inverse(&self) -> ProjectionResult<Arc<dyn CoordinateOperation>> {
        let inverse = self
            .transform
            .inverse()
            .map_err(|e| ProjectionError::NotInvertible(e.to_string()))?;
        Ok(Arc::new(AffineOperation::new(self.target, self.source, inverse)))
    }

    fn is_identity(&self) -> bool {
        self.transform.is_identity()
    }

    fn as_affine(&self) -> Option<AffineTransform> {
        Some(self.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_inverse_swaps_crs() {
        let op = IdentityOperation::new(Crs::wgs84(), Crs::epsg(4269));
        let inv = op.inverse().unwrap();
        assert_eq!(inv.source_crs(), Crs::epsg(4269));
        assert_eq!(inv.target_crs(), Crs::wgs84());
        assert_eq!(inv.transform(1.5, -2.0), Some((1.5, -2.0)));
    }

    #[test]
    fn test_affine_inverse() {
        let op = AffineOperation::new(
            Crs::epsg(100_001),
            Crs::epsg(100_002),
            AffineTransform::new(2.0, 0.0, 100.0, 0.0, 2.0, -50.0),
        );
        let (x, y) = op.transform(3.0, 4.0).unwrap();
        assert_eq!((x, y), (106.0, -42.0));
        let back = op.inverse().unwrap().transform(x, y).unwrap();
        assert!((back.0 - 3.0).abs() < 1e-12);
        assert!((back.1 - 4.0).abs() < 1e-12);
    }
}
