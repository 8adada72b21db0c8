//! Envelope reprojection.

use raster_common::Envelope;

use crate::error::{ProjectionError, ProjectionResult};
use crate::operation::CoordinateOperation;

/// Transform an envelope and return the bounding box of the result.
///
/// Affine operations map the four corners. Other operations sample
/// `densify` points along every edge, since a straight edge may become a
/// curve whose extremum lies between the corners.
pub fn transform_envelope(
    op: &dyn CoordinateOperation,
    envelope: &Envelope,
    densify: usize,
) -> ProjectionResult<Envelope> {
    if op.is_identity() {
        return Ok(*envelope);
    }

    let transformed = if let Some(affine) = op.as_affine() {
        Envelope::from_points(envelope.corners().iter().map(|&(x, y)| affine.apply(x, y)))
    } else {
        Envelope::from_points(
            edge_points(envelope, densify)
                .into_iter()
                .filter_map(|(x, y)| op.transform(x, y)),
        )
    };

    transformed.ok_or(ProjectionError::OutOfDomain {
        from: op.source_crs(),
        to: op.target_crs(),
    })
}

/// Points along the boundary of an envelope, `per_edge` on each edge
/// including both corners.
fn edge_points(envelope: &Envelope, per_edge: usize) -> Vec<(f64, f64)> {
    let n = per_edge.max(2);
    let step_x = envelope.width() / (n - 1) as f64;
    let step_y = envelope.height() / (n - 1) as f64;
    let mut points = Vec::with_capacity(n * 4);

    for i in 0..n {
        let x = envelope.min_x + step_x * i as f64;
        points.push((x, envelope.min_y));
        points.push((x, envelope.max_y));
    }
    // Corners already covered by the horizontal edges
    for i in 1..n - 1 {
        let y = envelope.min_y + step_y * i as f64;
        points.push((envelope.min_x, y));
        points.push((envelope.max_x, y));
    }

    points
}
