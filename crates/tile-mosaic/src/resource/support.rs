//! Read plumbing shared by the aggregated and mosaicked resources.

use projection::{transform_envelope, OperationFactory, ProjectionError};
use raster_common::{AffineTransform, Crs, Envelope, GridGeometry};

use crate::error::{MosaicError, Result};
use crate::resample::PixelTransform;

/// Reproject `envelope` from `from` to `to`.
///
/// Returns `Ok(None)` when no point of the envelope lies in the operation's
/// domain. A missing operation is an error.
pub(crate) fn reproject(
    factory: &dyn OperationFactory,
    envelope: &Envelope,
    from: &Crs,
    to: &Crs,
    densify: usize,
) -> Result<Option<Envelope>> {
    if from == to {
        return Ok(Some(*envelope));
    }
    let operation = factory.find_operation(from, to)?;
    match transform_envelope(operation.as_ref(), envelope, densify) {
        Ok(envelope) => Ok(Some(envelope)),
        Err(ProjectionError::OutOfDomain { .. }) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Envelope of `geometry` expressed in `crs`.
pub(crate) fn envelope_in(
    factory: &dyn OperationFactory,
    geometry: &GridGeometry,
    crs: &Crs,
    densify: usize,
) -> Result<Option<Envelope>> {
    let envelope = geometry
        .envelope()
        .ok_or_else(|| MosaicError::invalid_geometry("grid geometry declares no extent"))?;
    reproject(factory, &envelope, &geometry.crs, crs, densify)
}

/// Mapping from destination buffer pixels to source buffer pixels.
///
/// Destination buffer → destination grid → destination space → source
/// space → source grid → source buffer. Both buffers start at their
/// extent's lower corner.
pub(crate) fn pixel_transform(
    factory: &dyn OperationFactory,
    destination: &GridGeometry,
    source: &GridGeometry,
) -> Result<PixelTransform> {
    let before = destination.normalized().transform;
    let source = source.normalized();
    let after = source.transform.inverse()?;
    let operation = factory.find_operation(&destination.crs, &source.crs)?;
    Ok(PixelTransform::chain(before, operation, after))
}

/// Window of a tile to read for `domain`, grown by `margin` tile pixels.
///
/// `area` is the domain envelope in the tile's CRS. Tiles without a
/// declared extent are read over the domain's own grid grown by `margin`.
/// Returns `None` when the tile and the area share no pixel.
pub(crate) fn read_window(
    tile: &GridGeometry,
    area: &Envelope,
    domain: &GridGeometry,
    margin: i64,
) -> Result<Option<GridGeometry>> {
    if tile.extent.is_none() {
        let extent = domain.extent()?.expand(margin);
        return Ok(Some(domain.with_extent(extent)));
    }
    Ok(tile.subgrid(area, margin)?)
}

/// North-up grid over `envelope` at resolution `(res_x, res_y)`, with at
/// least one pixel per axis.
pub(crate) fn north_up_grid(envelope: &Envelope, res_x: f64, res_y: f64, crs: Crs) -> Result<GridGeometry> {
    if !(res_x > 0.0 && res_y > 0.0) || envelope.is_empty() {
        return Err(MosaicError::invalid_geometry(format!(
            "cannot lay a {res_x}x{res_y} grid over {envelope:?}"
        )));
    }
    let width = ((envelope.width() / res_x).round() as usize).max(1);
    let height = ((envelope.height() / res_y).round() as usize).max(1);
    let transform = AffineTransform::north_up(envelope.min_x, envelope.max_y, res_x, res_y);
    let extent = raster_common::GridExtent::from_size(width, height)?;
    Ok(GridGeometry::new(extent, transform, crs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::{AffineOperation, StandardOperationFactory};
    use raster_common::GridExtent;

    fn unit_grid(x0: f64, y_top: f64, width: usize, height: usize, crs: Crs) -> GridGeometry {
        GridGeometry::new(
            GridExtent::from_size(width, height).unwrap(),
            AffineTransform::north_up(x0, y_top, 1.0, 1.0),
            crs,
        )
    }

    #[test]
    fn test_pixel_transform_same_grid_is_identity() {
        let factory = StandardOperationFactory::new();
        let grid = unit_grid(0.0, 10.0, 10, 10, Crs::epsg(32633));
        let transform = pixel_transform(&factory, &grid, &grid).unwrap();
        assert!(transform.is_linear());
        let (x, y) = transform.apply(3.0, 4.0).unwrap();
        assert!((x - 3.0).abs() < 1e-12);
        assert!((y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_pixel_transform_offset_extent() {
        let factory = StandardOperationFactory::new();
        let full = unit_grid(0.0, 10.0, 10, 10, Crs::epsg(32633));
        let source = full.with_extent(GridExtent::new(2, 3, 9, 9).unwrap());
        let transform = pixel_transform(&factory, &full, &source).unwrap();
        // Destination (2, 3) is the first pixel of the source buffer
        let (x, y) = transform.apply(2.0, 3.0).unwrap();
        assert!(x.abs() < 1e-12);
        assert!(y.abs() < 1e-12);
    }

    #[test]
    fn test_pixel_transform_through_registered_operation() {
        let a = Crs::epsg(32633);
        let b = Crs::epsg(32634);
        let factory = StandardOperationFactory::new().with_operation(std::sync::Arc::new(
            AffineOperation::new(a, b, AffineTransform::translation(100.0, 0.0)),
        ));
        let destination = unit_grid(0.0, 10.0, 10, 10, a);
        let source = unit_grid(100.0, 10.0, 10, 10, b);
        let transform = pixel_transform(&factory, &destination, &source).unwrap();
        let (x, y) = transform.apply(5.0, 5.0).unwrap();
        assert!((x - 5.0).abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_transform_missing_operation() {
        let factory = StandardOperationFactory::new();
        let destination = unit_grid(0.0, 10.0, 10, 10, Crs::epsg(32633));
        let source = unit_grid(0.0, 10.0, 10, 10, Crs::epsg(32634));
        let result = pixel_transform(&factory, &destination, &source);
        assert!(matches!(
            result,
            Err(MosaicError::Projection(ProjectionError::NoOperationFound { .. }))
        ));
    }

    #[test]
    fn test_read_window_without_tile_extent() {
        let domain = unit_grid(0.0, 10.0, 4, 4, Crs::wgs84());
        let tile = GridGeometry::unbounded(AffineTransform::identity(), Crs::wgs84());
        let window = read_window(&tile, &domain.envelope().unwrap(), &domain, 5)
            .unwrap()
            .unwrap();
        assert_eq!(window.extent.unwrap(), GridExtent::new(-5, -5, 8, 8).unwrap());
        assert_eq!(window.transform, domain.transform);
    }

    #[test]
    fn test_north_up_grid() {
        let grid = north_up_grid(&Envelope::new(0.0, 0.0, 10.0, 5.0), 0.5, 0.5, Crs::wgs84()).unwrap();
        assert_eq!(grid.width(), 20);
        assert_eq!(grid.height(), 10);
        assert_eq!(grid.envelope(), Some(Envelope::new(0.0, 0.0, 10.0, 5.0)));
    }
}
