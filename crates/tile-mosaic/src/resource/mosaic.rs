//! Mosaic of tiles sharing one grid geometry.

use std::sync::Arc;

use projection::{OperationFactory, StandardOperationFactory};
use raster_common::{Envelope, GridGeometry, SampleDimension};
use rayon::ThreadPool;

use super::support::{envelope_in, pixel_transform};
use super::{RasterResource, Tile};
use crate::config::MosaicConfig;
use crate::error::{MosaicError, Result};
use crate::index::SpatialIndex;
use crate::resample::{resample_on, BorderMode};
use crate::types::{Coverage, RasterBuffer, SENTINEL};

/// Resource tiled over a single grid geometry.
///
/// Built from a group produced by the region calculator. Tiles are
/// composited with a nearest-neighbour kernel and no sentinel guard: where
/// tiles overlap, the later one in index order wins.
pub struct MosaickedResource {
    grid_geometry: GridGeometry,
    tiles: Vec<Tile>,
    index: SpatialIndex<usize>,
    sample_dimensions: Vec<SampleDimension>,
    factory: Arc<dyn OperationFactory>,
    config: MosaicConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl MosaickedResource {
    /// Mosaic `tiles` over `grid_geometry` with default options.
    pub fn new(grid_geometry: GridGeometry, tiles: Vec<Tile>) -> Result<Self> {
        Self::with_options(
            grid_geometry,
            tiles,
            Arc::new(StandardOperationFactory::new()),
            MosaicConfig::default(),
        )
    }

    pub fn with_options(
        grid_geometry: GridGeometry,
        tiles: Vec<Tile>,
        factory: Arc<dyn OperationFactory>,
        config: MosaicConfig,
    ) -> Result<Self> {
        let Some(first) = tiles.first() else {
            return Err(MosaicError::NoResources);
        };
        config.validate()?;
        grid_geometry.extent()?;

        let sample_dimensions = first.resource.sample_dimensions().to_vec();
        let mut entries = Vec::with_capacity(tiles.len());
        for (position, tile) in tiles.iter().enumerate() {
            let envelope = envelope_in(
                factory.as_ref(),
                tile.grid_geometry(),
                &grid_geometry.crs,
                config.envelope_densify,
            )?
            .ok_or_else(|| {
                MosaicError::invalid_geometry(format!("tile {} has no image in {}", tile.index, grid_geometry.crs))
            })?;
            entries.push((envelope, position));
        }

        tracing::debug!(
            tiles = tiles.len(),
            crs = %grid_geometry.crs,
            width = grid_geometry.width(),
            height = grid_geometry.height(),
            "Built mosaicked resource"
        );

        Ok(Self {
            grid_geometry,
            index: SpatialIndex::bulk_load(entries),
            tiles,
            sample_dimensions,
            factory,
            config,
            pool: None,
        })
    }

    /// Pool that reads spread their pixel loops over. Without one, reads
    /// stay on the calling thread.
    pub fn with_pool(mut self, pool: Option<Arc<ThreadPool>>) -> Self {
        self.pool = pool;
        self
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Part of the mosaic grid to render for `domain`.
    fn working_grid(&self, domain: Option<&GridGeometry>) -> Result<GridGeometry> {
        let Some(domain) = domain else {
            return Ok(self.grid_geometry.clone());
        };
        let area = envelope_in(
            self.factory.as_ref(),
            domain,
            &self.grid_geometry.crs,
            self.config.envelope_densify,
        )?
        .ok_or_else(|| MosaicError::disjoint_domain(format!("domain has no image in {}", self.grid_geometry.crs)))?;

        self.grid_geometry
            .subgrid(&area, self.config.mosaic_margin)?
            .ok_or_else(|| MosaicError::disjoint_domain(format!("{area:?} misses the mosaic")))
    }

    fn candidates(&self, area: &Envelope) -> Vec<&Tile> {
        let mut found: Vec<usize> = self.index.query(area).iter().map(|e| e.payload).collect();
        found.sort_unstable();
        found.into_iter().map(|position| &self.tiles[position]).collect()
    }
}

impl RasterResource for MosaickedResource {
    fn grid_geometry(&self) -> &GridGeometry {
        &self.grid_geometry
    }

    fn sample_dimensions(&self) -> &[SampleDimension] {
        &self.sample_dimensions
    }

    fn read(&self, domain: Option<&GridGeometry>, bands: &[usize]) -> Result<Coverage> {
        let working = self.working_grid(domain)?;
        let normalized = working.normalized();
        let area = normalized
            .envelope()
            .ok_or_else(|| MosaicError::invalid_geometry("mosaic grid declares no extent"))?;

        let tiles = self.candidates(&area);
        tracing::debug!(
            extent = ?working.extent,
            tiles = tiles.len(),
            "Reading mosaic region from {} tiles",
            tiles.len()
        );

        match tiles.as_slice() {
            [] => return Err(MosaicError::disjoint_domain(format!("{area:?} misses every tile"))),
            [tile] => return tile.resource.read(domain, bands),
            _ => {}
        }

        let mut destination: Option<RasterBuffer> = None;
        let mut sample_dimensions = Vec::new();

        for tile in tiles {
            let coverage = match tile.resource.read(domain, bands) {
                Ok(coverage) => coverage,
                Err(err) if err.is_disjoint() => {
                    tracing::trace!(tile = tile.index, error = %err, "skipping disjoint tile");
                    continue;
                }
                Err(err) => return Err(err),
            };

            let target = destination.get_or_insert_with(|| {
                RasterBuffer::filled(normalized.width(), normalized.height(), coverage.band_count(), SENTINEL)
            });
            let transform = pixel_transform(self.factory.as_ref(), &normalized, &coverage.grid_geometry)?;
            let inside = resample_on(
                self.pool.as_deref(),
                &transform,
                target,
                &coverage.buffer,
                self.config.mosaic_interpolation,
                BorderMode::Preserve,
            )?;
            tracing::trace!(tile = tile.index, inside, "resampled tile");

            if inside > 0 {
                sample_dimensions = coverage.sample_dimensions;
            }
        }

        match destination {
            Some(buffer) if !sample_dimensions.is_empty() => Coverage::new(working, buffer, sample_dimensions),
            _ => Err(MosaicError::disjoint_domain(format!("no tile contributed to {area:?}"))),
        }
    }
}
