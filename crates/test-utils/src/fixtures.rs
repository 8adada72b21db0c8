//! Common tile fixtures for tile-mosaic tests.
//!
//! Every fixture builds single-band [`MemoryResource`]s on north-up grids
//! whose pixel values follow [`create_offset_grid`], so a composited pixel
//! can be traced back to the tile it came from.

use std::sync::Arc;

use raster_common::{AffineTransform, Crs, Envelope, GridExtent, GridGeometry, SampleDimension};
use tile_mosaic::{Coverage, MemoryResource, MosaicError, RasterBuffer, RasterResource, Tile};

use crate::generators::{create_constant_grid, create_offset_grid};

/// Projected CRS used by fixtures that must not match any built-in operation.
pub const LOCAL_CRS: Crs = Crs {
    code: raster_common::CrsCode::Epsg(32633),
};

/// North-up grid whose upper-left corner is `(min_x, max_y)`.
pub fn north_up_grid(min_x: f64, max_y: f64, width: usize, height: usize, res: f64, crs: Crs) -> GridGeometry {
    GridGeometry::new(
        GridExtent::new(0, 0, width as i64 - 1, height as i64 - 1)
            .unwrap_or_else(|err| panic!("fixture grid {width}x{height}: {err}")),
        AffineTransform::north_up(min_x, max_y, res, res),
        crs,
    )
}

/// Single-band resource holding `data` on `geometry`.
pub fn memory_resource(geometry: GridGeometry, data: Vec<f32>) -> Arc<MemoryResource> {
    let width = geometry.width();
    let height = geometry.height();
    let buffer = RasterBuffer::new(width, height, 1, data)
        .unwrap_or_else(|err| panic!("fixture buffer: {err}"));
    let resource = MemoryResource::new(geometry, buffer, vec![SampleDimension::new("value")])
        .unwrap_or_else(|err| panic!("fixture resource: {err}"));
    Arc::new(resource)
}

/// Tile covering `envelope` at resolution `res` with the offset test pattern.
pub fn pattern_tile(envelope: Envelope, res: f64, offset: f32, crs: Crs) -> Arc<MemoryResource> {
    let width = (envelope.width() / res).round() as usize;
    let height = (envelope.height() / res).round() as usize;
    let geometry = north_up_grid(envelope.min_x, envelope.max_y, width, height, res, crs);
    memory_resource(geometry, create_offset_grid(width, height, offset))
}

/// Tile covering `envelope` at resolution `res` filled with `value`.
pub fn constant_tile(envelope: Envelope, res: f64, value: f32, crs: Crs) -> Arc<MemoryResource> {
    let width = (envelope.width() / res).round() as usize;
    let height = (envelope.height() / res).round() as usize;
    let geometry = north_up_grid(envelope.min_x, envelope.max_y, width, height, res, crs);
    memory_resource(geometry, create_constant_grid(width, height, value))
}

/// A `2 * size` square grid split into four `size × size` quadrant tiles.
///
/// All tiles share the returned grid's transform and differ only by their
/// extent. Quadrant `q` (0 = top-left, 1 = top-right, 2 = bottom-left,
/// 3 = bottom-right) holds the test pattern offset by `q * 100_000`.
pub fn quadrant_tiles(size: usize) -> (GridGeometry, Vec<Tile>) {
    let full = north_up_grid(0.0, 2.0 * size as f64, 2 * size, 2 * size, 1.0, LOCAL_CRS);
    let mut tiles = Vec::with_capacity(4);
    for q in 0..4usize {
        let x0 = ((q % 2) * size) as i64;
        let y0 = ((q / 2) * size) as i64;
        let extent = GridExtent::new(x0, y0, x0 + size as i64 - 1, y0 + size as i64 - 1)
            .unwrap_or_else(|err| panic!("quadrant extent: {err}"));
        let data = create_offset_grid(size, size, quadrant_offset(q));
        let resource: Arc<dyn RasterResource> = memory_resource(full.with_extent(extent), data);
        tiles.push(Tile::new(q, resource));
    }
    (full, tiles)
}

/// Value added to the pattern of quadrant `q`.
pub fn quadrant_offset(q: usize) -> f32 {
    q as f32 * 100_000.0
}

/// Two 8×8 unit tiles overlapping on a 4-column band.
///
/// Tile A covers x in `[0, 8]` with value 1, tile B covers x in `[4, 12]`
/// with value 2; both span y in `[0, 8]`.
pub fn overlapping_pair(crs: Crs) -> (Arc<MemoryResource>, Arc<MemoryResource>) {
    (
        constant_tile(Envelope::new(0.0, 0.0, 8.0, 8.0), 1.0, 1.0, crs),
        constant_tile(Envelope::new(4.0, 0.0, 12.0, 8.0), 1.0, 2.0, crs),
    )
}

/// Resource that answers every read with the same coverage, whatever the
/// requested domain, or with a disjoint-domain error when it has none.
///
/// Its grid geometry (and so its envelope) is whatever it is built with,
/// which lets tests make it claim pixels it never returns.
pub struct CannedResource {
    grid_geometry: GridGeometry,
    sample_dimensions: Vec<SampleDimension>,
    response: Option<Coverage>,
}

impl CannedResource {
    /// Claims `grid_geometry` but every read comes back disjoint.
    pub fn disjoint(grid_geometry: GridGeometry, band: &str) -> Arc<Self> {
        Arc::new(Self {
            grid_geometry,
            sample_dimensions: vec![SampleDimension::new(band)],
            response: None,
        })
    }

    /// Claims `grid_geometry` but every read returns `response`.
    pub fn answering(grid_geometry: GridGeometry, response: Coverage) -> Arc<Self> {
        Arc::new(Self {
            grid_geometry,
            sample_dimensions: response.sample_dimensions.clone(),
            response: Some(response),
        })
    }
}

impl RasterResource for CannedResource {
    fn grid_geometry(&self) -> &GridGeometry {
        &self.grid_geometry
    }

    fn sample_dimensions(&self) -> &[SampleDimension] {
        &self.sample_dimensions
    }

    fn read(&self, _domain: Option<&GridGeometry>, _bands: &[usize]) -> tile_mosaic::Result<Coverage> {
        self.response
            .clone()
            .ok_or_else(|| MosaicError::disjoint_domain("canned resource holds no pixels"))
    }
}
