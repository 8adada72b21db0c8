//! Tests for grid geometry derivations used by the mosaic engine.

use raster_common::{AffineTransform, Crs, Envelope, GridExtent, GridGeometry};

fn geometry(extent: GridExtent, res: f64, origin: (f64, f64)) -> GridGeometry {
    GridGeometry::new(
        extent,
        AffineTransform::north_up(origin.0, origin.1, res, res),
        Crs::epsg(32633),
    )
}

// ============================================================================
// Envelope tests
// ============================================================================

#[test]
fn test_envelope_of_offset_extent() {
    let grid = geometry(GridExtent::new(10, 20, 19, 29).unwrap(), 2.0, (0.0, 100.0));
    let env = grid.envelope().unwrap();
    assert_eq!(env, Envelope::new(20.0, 40.0, 40.0, 60.0));
}

#[test]
fn test_envelope_of_unbounded_geometry() {
    let grid = GridGeometry::unbounded(AffineTransform::identity(), Crs::wgs84());
    assert!(grid.envelope().is_none());
    assert!(grid.extent().is_err());
    assert_eq!(grid.width(), 0);
}

#[test]
fn test_rotated_envelope_is_axis_aligned() {
    // 90 degree rotation: x' = -y, y' = x
    let grid = GridGeometry::new(
        GridExtent::from_size(4, 2).unwrap(),
        AffineTransform::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0),
        Crs::wgs84(),
    );
    let env = grid.envelope().unwrap();
    assert_eq!(env, Envelope::new(-1.5, -0.5, 0.5, 3.5));
}

// ============================================================================
// Normalization tests
// ============================================================================

#[test]
fn test_normalized_is_pure_translation() {
    let grid = geometry(GridExtent::new(-5, 7, 4, 16).unwrap(), 0.5, (3.0, 9.0));
    let normalized = grid.normalized();

    let extent = normalized.extent.unwrap();
    assert_eq!(extent.x_min, 0);
    assert_eq!(extent.y_min, 0);
    assert_eq!(extent.width(), 10);
    assert_eq!(extent.height(), 10);

    // Same pixel centre in space
    let before = grid.transform.apply(-5.0, 7.0);
    let after = normalized.transform.apply(0.0, 0.0);
    assert!((before.0 - after.0).abs() < 1e-12);
    assert!((before.1 - after.1).abs() < 1e-12);
}

#[test]
fn test_normalized_already_at_origin() {
    let grid = geometry(GridExtent::from_size(3, 3).unwrap(), 1.0, (0.0, 3.0));
    assert_eq!(grid.normalized(), grid);
}

// ============================================================================
// Sub-grid tests
// ============================================================================

#[test]
fn test_subgrid_inside() {
    let grid = geometry(GridExtent::from_size(100, 100).unwrap(), 1.0, (0.0, 100.0));
    let sub = grid
        .subgrid(&Envelope::new(10.0, 10.0, 20.0, 20.0), 0)
        .unwrap()
        .unwrap();
    let extent = sub.extent.unwrap();
    assert_eq!(extent, GridExtent::new(10, 80, 19, 89).unwrap());
    assert_eq!(sub.transform, grid.transform);
}

#[test]
fn test_subgrid_enclosing_rounding() {
    let grid = geometry(GridExtent::from_size(100, 100).unwrap(), 1.0, (0.0, 100.0));
    let sub = grid
        .subgrid(&Envelope::new(10.2, 10.2, 19.8, 19.8), 0)
        .unwrap()
        .unwrap();
    // Partially covered pixels are kept
    assert_eq!(sub.extent.unwrap(), GridExtent::new(10, 80, 19, 89).unwrap());
}

#[test]
fn test_subgrid_with_margin() {
    let grid = geometry(GridExtent::from_size(100, 100).unwrap(), 1.0, (0.0, 100.0));
    let sub = grid
        .subgrid(&Envelope::new(10.0, 10.0, 20.0, 20.0), 5)
        .unwrap()
        .unwrap();
    assert_eq!(sub.extent.unwrap(), GridExtent::new(5, 75, 24, 94).unwrap());
}

#[test]
fn test_geometry_json_keeps_unbounded_extent() {
    let grid = GridGeometry::unbounded(AffineTransform::north_up(0.0, 10.0, 0.5, 0.5), Crs::wgs84());
    let json = serde_json::to_string(&grid).unwrap();
    let back: GridGeometry = serde_json::from_str(&json).unwrap();
    assert_eq!(back, grid);
    assert!(back.extent.is_none());
}
