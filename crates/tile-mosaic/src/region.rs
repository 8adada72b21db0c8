//! Grouping of tiles that share one grid.
//!
//! Two tiles belong together when they use the same CRS and the same
//! grid-to-space scale, rotation and shear, and the origin of one falls on
//! a whole pixel of the other. Every group is laid on the grid of its first
//! member; the group extent is the union of the member extents on that grid.

use std::sync::Arc;

use raster_common::{AffineTransform, Crs, GridExtent, GridGeometry};

use crate::bitset::BitSet2D;
use crate::config::MosaicConfig;
use crate::error::{MosaicError, Result};
use crate::resource::{RasterResource, Tile};

/// Largest distance from a whole pixel at which a tile origin still snaps.
const OFFSET_TOLERANCE: f64 = 1e-6;

/// Relative tolerance on the linear part of grid transforms.
const SCALE_TOLERANCE: f64 = 1e-9;

/// Tiles sharing one grid geometry.
#[derive(Debug, Clone)]
pub struct TileGroup {
    /// Grid enclosing every member.
    pub grid_geometry: GridGeometry,
    /// Members in index order.
    pub tiles: Vec<Tile>,
}

impl TileGroup {
    /// A group of one needs no mosaic around it.
    pub fn is_singleton(&self) -> bool {
        self.tiles.len() == 1
    }
}

struct PendingGroup {
    crs: Crs,
    transform: AffineTransform,
    inverse: Option<AffineTransform>,
    extent: Option<GridExtent>,
    members: Vec<(Tile, Option<GridExtent>)>,
}

impl PendingGroup {
    fn start(tile: Tile) -> Self {
        let geometry = tile.grid_geometry().clone();
        let inverse = geometry.transform.inverse().ok().filter(|_| geometry.extent.is_some());
        Self {
            crs: geometry.crs,
            transform: geometry.transform,
            inverse,
            extent: geometry.extent,
            members: vec![(tile, geometry.extent)],
        }
    }

    /// Extent of `geometry` on this group's grid, if it can join.
    fn place(&self, geometry: &GridGeometry) -> Option<GridExtent> {
        let inverse = self.inverse.as_ref()?;
        let extent = geometry.extent?;
        if geometry.crs != self.crs {
            return None;
        }
        let (res_x, res_y) = self.transform.resolution();
        let tolerance = SCALE_TOLERANCE * res_x.max(res_y);
        if !self.transform.linear_part_eq(&geometry.transform, tolerance) {
            return None;
        }

        let (x, y) = geometry.transform.apply(0.0, 0.0);
        let (ox, oy) = inverse.apply(x, y);
        let (dx, dy) = (ox.round(), oy.round());
        if (ox - dx).abs() > OFFSET_TOLERANCE || (oy - dy).abs() > OFFSET_TOLERANCE {
            return None;
        }
        Some(extent.translate(dx as i64, dy as i64))
    }

    fn push(&mut self, tile: Tile, placed: GridExtent) {
        self.extent = Some(match self.extent {
            Some(extent) => extent.union(&placed),
            None => placed,
        });
        self.members.push((tile, Some(placed)));
    }
}

/// Partitions tiles into groups sharing one grid geometry.
///
/// Tiles are numbered in the order they are added. A tile that matches no
/// existing group starts a new one.
pub struct RegionCalculator {
    groups: Vec<PendingGroup>,
    next_index: usize,
    config: MosaicConfig,
}

impl RegionCalculator {
    pub fn new() -> Self {
        Self::with_config(MosaicConfig::default())
    }

    pub fn with_config(config: MosaicConfig) -> Self {
        Self {
            groups: Vec::new(),
            next_index: 0,
            config,
        }
    }

    /// Number of tiles added so far.
    pub fn len(&self) -> usize {
        self.next_index
    }

    pub fn is_empty(&self) -> bool {
        self.next_index == 0
    }

    /// Add a resource as the next tile.
    pub fn add(&mut self, resource: Arc<dyn RasterResource>) {
        let tile = Tile::new(self.next_index, resource);
        self.add_tile(tile);
    }

    /// Add a tile that already carries its index.
    pub fn add_tile(&mut self, tile: Tile) {
        self.next_index = self.next_index.max(tile.index + 1);

        for group in self.groups.iter_mut() {
            if let Some(placed) = group.place(tile.grid_geometry()) {
                tracing::trace!(tile = tile.index, extent = ?placed, "tile joins existing group");
                group.push(tile, placed);
                return;
            }
        }

        tracing::trace!(tile = tile.index, "tile starts a new group");
        self.groups.push(PendingGroup::start(tile));
    }

    /// Close every group.
    ///
    /// Groups come out in the order of their first member. Fails when a
    /// group's members cover no pixel at all.
    pub fn finish(self) -> Result<Vec<TileGroup>> {
        let limit = self.config.footprint_check_limit;
        let mut groups = Vec::with_capacity(self.groups.len());

        for pending in self.groups {
            let mut members = pending.members;
            members.sort_by_key(|(tile, _)| tile.index);

            let grid_geometry = match pending.extent {
                Some(extent) => {
                    if members.len() > 1 && extent.len() as u64 <= limit {
                        check_footprint(&extent, &members)?;
                    }
                    GridGeometry::new(extent, pending.transform, pending.crs)
                }
                None => GridGeometry::unbounded(pending.transform, pending.crs),
            };

            groups.push(TileGroup {
                grid_geometry,
                tiles: members.into_iter().map(|(tile, _)| tile).collect(),
            });
        }

        tracing::debug!(groups = groups.len(), "Computed tile groups");
        Ok(groups)
    }
}

impl Default for RegionCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Rasterise member footprints on the group extent and report overlaps
/// and holes.
fn check_footprint(extent: &GridExtent, members: &[(Tile, Option<GridExtent>)]) -> Result<()> {
    let mut covered = BitSet2D::new(extent.width(), extent.height());

    for (tile, placed) in members {
        let Some(placed) = placed else { continue };
        let local = placed.translate(-extent.x_min, -extent.y_min);
        let mut footprint = BitSet2D::new(extent.width(), extent.height());
        footprint.set_rect(&local);

        if let Some(overlap) = covered.intersect_set(&footprint) {
            tracing::warn!(
                tile = tile.index,
                overlap = ?overlap.translate(extent.x_min, extent.y_min),
                "tile overlaps earlier members of its group"
            );
        }
        covered.set_rect(&local);
    }

    let Some(area) = covered.area_set() else {
        return Err(MosaicError::invalid_geometry(format!(
            "group extent {extent:?} holds no member pixel"
        )));
    };
    if area.width() != extent.width() || area.height() != extent.height() {
        tracing::debug!(
            extent = ?extent,
            area = ?area.translate(extent.x_min, extent.y_min),
            "group footprint has empty rows between members"
        );
    }
    if let Some(hole) = covered.area_cleared() {
        tracing::debug!(
            extent = ?extent,
            uncovered = ?hole.translate(extent.x_min, extent.y_min),
            cells = covered.len() - covered.count_ones(),
            "group footprint is not fully covered"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResource;
    use crate::types::RasterBuffer;
    use raster_common::SampleDimension;

    fn tile_at(x0: f64, y_top: f64, size: usize, res: f64, crs: Crs) -> Arc<dyn RasterResource> {
        let grid = GridGeometry::new(
            GridExtent::from_size(size, size).unwrap(),
            AffineTransform::north_up(x0, y_top, res, res),
            crs,
        );
        let buffer = RasterBuffer::filled(size, size, 1, 1.0);
        Arc::new(MemoryResource::new(grid, buffer, vec![SampleDimension::new("v")]).unwrap())
    }

    #[test]
    fn test_adjacent_tiles_group() {
        let mut calculator = RegionCalculator::new();
        calculator.add(tile_at(0.0, 10.0, 10, 1.0, Crs::wgs84()));
        calculator.add(tile_at(10.0, 10.0, 10, 1.0, Crs::wgs84()));
        calculator.add(tile_at(0.0, 0.0, 10, 1.0, Crs::wgs84()));

        let groups = calculator.finish().unwrap();
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.tiles.len(), 3);
        assert_eq!(group.grid_geometry.extent, Some(GridExtent::new(0, 0, 19, 19).unwrap()));
        assert_eq!(
            group.grid_geometry.envelope(),
            Some(raster_common::Envelope::new(0.0, -10.0, 20.0, 10.0))
        );
    }

    #[test]
    fn test_different_resolution_splits() {
        let mut calculator = RegionCalculator::new();
        calculator.add(tile_at(0.0, 10.0, 10, 1.0, Crs::wgs84()));
        calculator.add(tile_at(10.0, 10.0, 5, 2.0, Crs::wgs84()));

        let groups = calculator.finish().unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(TileGroup::is_singleton));
        assert_eq!(groups[0].tiles[0].index, 0);
        assert_eq!(groups[1].tiles[0].index, 1);
    }

    #[test]
    fn test_different_crs_splits() {
        let mut calculator = RegionCalculator::new();
        calculator.add(tile_at(0.0, 10.0, 10, 1.0, Crs::wgs84()));
        calculator.add(tile_at(10.0, 10.0, 10, 1.0, Crs::epsg(4269)));
        assert_eq!(calculator.finish().unwrap().len(), 2);
    }

    #[test]
    fn test_fractional_offset_splits() {
        let mut calculator = RegionCalculator::new();
        calculator.add(tile_at(0.0, 10.0, 10, 1.0, Crs::wgs84()));
        calculator.add(tile_at(10.5, 10.0, 10, 1.0, Crs::wgs84()));
        assert_eq!(calculator.finish().unwrap().len(), 2);
    }

    #[test]
    fn test_overlapping_members_still_group() {
        let mut calculator = RegionCalculator::new();
        calculator.add(tile_at(0.0, 10.0, 10, 1.0, Crs::wgs84()));
        calculator.add(tile_at(5.0, 10.0, 10, 1.0, Crs::wgs84()));
        let groups = calculator.finish().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].grid_geometry.width(), 15);
    }

    #[test]
    fn test_footprint_check_reports_gap() {
        let extent = GridExtent::new(0, 0, 9, 9).unwrap();
        let resource = tile_at(0.0, 10.0, 4, 1.0, Crs::wgs84());
        let members = vec![
            (Tile::new(0, resource.clone()), Some(GridExtent::new(0, 0, 3, 3).unwrap())),
            (Tile::new(1, resource), Some(GridExtent::new(6, 6, 9, 9).unwrap())),
        ];
        assert!(check_footprint(&extent, &members).is_ok());
    }
}
