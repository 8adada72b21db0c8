//! Aggregation of heterogeneous tiles.
//!
//! Member tiles may use different CRS and resolutions. Their envelopes are
//! brought into one working CRS and indexed; a read resamples every tile
//! overlapping the request onto the requested grid and composites them in
//! index order, the first tile to write a pixel keeping it.

use std::collections::HashMap;
use std::sync::Arc;

use projection::{OperationFactory, ProjectionError, StandardOperationFactory};
use raster_common::{Crs, Envelope, GridGeometry, SampleDimension};
use rayon::prelude::*;
use rayon::ThreadPool;

use super::support::{envelope_in, north_up_grid, pixel_transform, read_window, reproject};
use super::{RasterResource, Tile};
use crate::config::MosaicConfig;
use crate::error::{MosaicError, Result};
use crate::index::SpatialIndex;
use crate::resample::{resample_on, BorderMode};
use crate::types::{Coverage, RasterBuffer, SENTINEL};

/// Resource combining tiles that do not share a grid geometry.
pub struct AggregatedResource {
    tiles: Vec<Tile>,
    index: SpatialIndex<usize>,
    grid_geometry: GridGeometry,
    envelope: Envelope,
    sample_dimensions: Vec<SampleDimension>,
    factory: Arc<dyn OperationFactory>,
    config: MosaicConfig,
    pool: Option<Arc<ThreadPool>>,
}

/// Construction options for [`AggregatedResource`].
pub struct AggregatedResourceBuilder {
    resources: Vec<Arc<dyn RasterResource>>,
    crs: Option<Crs>,
    factory: Option<Arc<dyn OperationFactory>>,
    config: MosaicConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl AggregatedResourceBuilder {
    pub fn new(resources: Vec<Arc<dyn RasterResource>>) -> Self {
        Self {
            resources,
            crs: None,
            factory: None,
            config: MosaicConfig::default(),
            pool: None,
        }
    }

    /// Working CRS; by default the most common member CRS.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn OperationFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_config(mut self, config: MosaicConfig) -> Self {
        self.config = config;
        self
    }

    /// Pool that reads spread their pixel loops over. Without one, reads
    /// stay on the calling thread.
    pub fn with_pool(mut self, pool: Option<Arc<ThreadPool>>) -> Self {
        self.pool = pool;
        self
    }

    /// Index the members.
    ///
    /// Fails when no member is given, when a member has no envelope, or
    /// when a member envelope cannot be brought into the working CRS.
    pub fn build(self) -> Result<AggregatedResource> {
        if self.resources.is_empty() {
            return Err(MosaicError::NoResources);
        }
        self.config.validate()?;

        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(StandardOperationFactory::new()));
        let tiles = Tile::enumerate(self.resources);
        let crs = match self.crs {
            Some(crs) => crs,
            None => most_common_crs(&tiles)?,
        };

        let mut entries = Vec::with_capacity(tiles.len());
        let mut resolution: Option<(f64, f64)> = None;
        for (position, tile) in tiles.iter().enumerate() {
            let geometry = tile.grid_geometry();
            let native = tile.resource.envelope().ok_or_else(|| {
                MosaicError::invalid_geometry(format!("tile {} declares no envelope", tile.index))
            })?;
            let envelope = reproject(
                factory.as_ref(),
                &native,
                &geometry.crs,
                &crs,
                self.config.envelope_densify,
            )?
            .ok_or(ProjectionError::OutOfDomain {
                from: geometry.crs,
                to: crs,
            })?;

            if geometry.extent.is_some() {
                let res_x = envelope.width() / geometry.width() as f64;
                let res_y = envelope.height() / geometry.height() as f64;
                resolution = Some(match resolution {
                    Some((x, y)) => (x.min(res_x), y.min(res_y)),
                    None => (res_x, res_y),
                });
            }
            entries.push((envelope, position));
        }

        let index = SpatialIndex::bulk_load(entries);
        let envelope = index
            .bounds()
            .ok_or_else(|| MosaicError::invalid_geometry("members cover no area"))?;
        let grid_geometry = match resolution {
            Some((res_x, res_y)) => north_up_grid(&envelope, res_x, res_y, crs)?,
            None => GridGeometry::unbounded(Default::default(), crs),
        };
        let sample_dimensions = tiles[0].resource.sample_dimensions().to_vec();

        tracing::debug!(
            tiles = tiles.len(),
            crs = %crs,
            envelope = ?envelope,
            width = grid_geometry.width(),
            height = grid_geometry.height(),
            "Built aggregated resource"
        );

        Ok(AggregatedResource {
            tiles,
            index,
            grid_geometry,
            envelope,
            sample_dimensions,
            factory,
            config: self.config,
            pool: self.pool,
        })
    }
}

impl AggregatedResource {
    /// Aggregate `resources` with default options.
    pub fn new(resources: Vec<Arc<dyn RasterResource>>) -> Result<Self> {
        AggregatedResourceBuilder::new(resources).build()
    }

    pub fn builder(resources: Vec<Arc<dyn RasterResource>>) -> AggregatedResourceBuilder {
        AggregatedResourceBuilder::new(resources)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Working CRS of the index and declared envelope.
    pub fn crs(&self) -> Crs {
        self.grid_geometry.crs
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    /// Member tiles whose working-CRS envelope overlaps `area`, in index order.
    fn candidates(&self, area: &Envelope) -> Vec<&Tile> {
        let mut found: Vec<usize> = self.index.query(area).iter().map(|e| e.payload).collect();
        found.sort_unstable();
        found.into_iter().map(|position| &self.tiles[position]).collect()
    }

    fn pool(&self) -> Option<&ThreadPool> {
        self.pool.as_deref()
    }

    /// Read one tile over `domain` and resample it onto a fresh buffer.
    ///
    /// Returns `None` when the tile turns out not to overlap the domain,
    /// otherwise the buffer, the tile's bands and the number of pixels
    /// (per band) the tile reached.
    fn render_tile(
        &self,
        tile: &Tile,
        domain: &GridGeometry,
        domain_envelope: &Envelope,
        bands: &[usize],
    ) -> Result<Option<(RasterBuffer, Vec<SampleDimension>, usize)>> {
        let geometry = tile.grid_geometry();
        let Some(area) = reproject(
            self.factory.as_ref(),
            domain_envelope,
            &domain.crs,
            &geometry.crs,
            self.config.envelope_densify,
        )?
        else {
            tracing::trace!(tile = tile.index, "domain has no image in tile CRS");
            return Ok(None);
        };
        let Some(window) = read_window(geometry, &area, domain, self.config.aggregate_margin)? else {
            tracing::trace!(tile = tile.index, "tile window is empty");
            return Ok(None);
        };

        let coverage = match tile.resource.read(Some(&window), bands) {
            Ok(coverage) => coverage.converted(),
            Err(err) if err.is_disjoint() => {
                tracing::trace!(tile = tile.index, error = %err, "skipping disjoint tile");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let transform = pixel_transform(self.factory.as_ref(), domain, &coverage.grid_geometry)?;
        let mut working = RasterBuffer::filled(
            domain.width(),
            domain.height(),
            coverage.band_count(),
            SENTINEL,
        );
        let inside = resample_on(
            self.pool(),
            &transform,
            &mut working,
            &coverage.buffer,
            self.config.aggregate_interpolation,
            BorderMode::Fill(SENTINEL),
        )?;
        tracing::trace!(tile = tile.index, inside, "resampled tile");

        Ok(Some((working, coverage.sample_dimensions, inside)))
    }
}

impl RasterResource for AggregatedResource {
    fn grid_geometry(&self) -> &GridGeometry {
        &self.grid_geometry
    }

    fn sample_dimensions(&self) -> &[SampleDimension] {
        &self.sample_dimensions
    }

    fn envelope(&self) -> Option<Envelope> {
        Some(self.envelope)
    }

    fn read(&self, domain: Option<&GridGeometry>, bands: &[usize]) -> Result<Coverage> {
        let domain = domain.unwrap_or(&self.grid_geometry);
        let normalized = domain.normalized();
        let domain_envelope = normalized
            .envelope()
            .ok_or_else(|| MosaicError::invalid_geometry("read domain declares no extent"))?;

        let query = envelope_in(
            self.factory.as_ref(),
            &normalized,
            &self.grid_geometry.crs,
            self.config.envelope_densify,
        )?
        .ok_or_else(|| MosaicError::disjoint_domain(format!("{domain_envelope:?} has no image in {}", self.crs())))?;

        let tiles = self.candidates(&query);
        tracing::debug!(
            query = ?query,
            tiles = tiles.len(),
            "Reading aggregated region from {} tiles",
            tiles.len()
        );

        match tiles.as_slice() {
            [] => {
                return Err(MosaicError::disjoint_domain(format!(
                    "{query:?} misses every tile"
                )))
            }
            [tile] => return tile.resource.read(Some(domain), bands),
            _ => {}
        }

        let mut destination: Option<RasterBuffer> = None;
        let mut sample_dimensions = Vec::new();

        for tile in tiles {
            let Some((working, dims, inside)) = self.render_tile(tile, &normalized, &domain_envelope, bands)?
            else {
                continue;
            };
            if inside == 0 {
                tracing::trace!(tile = tile.index, "tile reached no pixel of the domain");
                continue;
            }
            match destination.as_mut() {
                None => destination = Some(working),
                Some(target) => {
                    if target.bands != working.bands {
                        return Err(MosaicError::IncompatibleSampleDimensions(format!(
                            "tile {} has {} bands, earlier tiles have {}",
                            tile.index, working.bands, target.bands
                        )));
                    }
                    fill_missing(self.pool(), target, &working);
                }
            }
            sample_dimensions = dims;
        }

        let destination = match destination {
            Some(buffer) if !buffer.is_all_sentinel() => buffer,
            _ => {
                return Err(MosaicError::disjoint_domain(format!(
                    "no tile contributed to {query:?}"
                )))
            }
        };

        Coverage::new(domain.clone(), destination, sample_dimensions)
    }
}

/// Copy `source` samples into `target` wherever `target` is still empty.
fn fill_missing(pool: Option<&ThreadPool>, target: &mut RasterBuffer, source: &RasterBuffer) {
    let fill = |(dst, &src): (&mut f32, &f32)| {
        if dst.is_nan() && !src.is_nan() {
            *dst = src;
        }
    };
    match pool {
        Some(pool) => pool.install(|| {
            target
                .data
                .par_iter_mut()
                .zip(source.data.par_iter())
                .for_each(fill)
        }),
        None => target.data.iter_mut().zip(source.data.iter()).for_each(fill),
    }
}

/// Most frequent member CRS.
///
/// Ties go to the CRS whose first occurrence comes last.
fn most_common_crs(tiles: &[Tile]) -> Result<Crs> {
    let mut counts: HashMap<Crs, (usize, usize)> = HashMap::new();
    for (position, tile) in tiles.iter().enumerate() {
        counts.entry(tile.grid_geometry().crs).or_insert((0, position)).0 += 1;
    }
    counts
        .into_iter()
        .max_by_key(|&(_, (count, first))| (count, first))
        .map(|(crs, _)| crs)
        .ok_or(MosaicError::NoResources)
}
