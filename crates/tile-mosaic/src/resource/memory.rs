//! In-memory raster resource.

use std::sync::Arc;

use projection::{OperationFactory, StandardOperationFactory};
use raster_common::{GridGeometry, SampleDimension};

use super::support::reproject;
use super::{resolve_bands, RasterResource};
use crate::config::MosaicConfig;
use crate::error::{MosaicError, Result};
use crate::types::{Coverage, RasterBuffer};

/// A raster held entirely in memory.
///
/// Reads return the pixels of the requested domain's footprint, clipped to
/// the resource extent with enclosing rounding. The returned coverage lies
/// on the resource's own grid; no resampling happens here.
pub struct MemoryResource {
    coverage: Coverage,
    factory: Arc<dyn OperationFactory>,
    densify: usize,
}

impl MemoryResource {
    /// Wrap a buffer lying on `grid_geometry`.
    pub fn new(
        grid_geometry: GridGeometry,
        buffer: RasterBuffer,
        sample_dimensions: Vec<SampleDimension>,
    ) -> Result<Self> {
        let coverage = Coverage::new(grid_geometry, buffer, sample_dimensions)?;
        Ok(Self::from_coverage(coverage))
    }

    pub fn from_coverage(coverage: Coverage) -> Self {
        Self {
            coverage,
            factory: Arc::new(StandardOperationFactory::new()),
            densify: MosaicConfig::default().envelope_densify,
        }
    }

    /// Operation factory used to bring foreign domains into this CRS.
    pub fn with_factory(mut self, factory: Arc<dyn OperationFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn buffer(&self) -> &RasterBuffer {
        &self.coverage.buffer
    }
}

impl RasterResource for MemoryResource {
    fn grid_geometry(&self) -> &GridGeometry {
        &self.coverage.grid_geometry
    }

    fn sample_dimensions(&self) -> &[SampleDimension] {
        &self.coverage.sample_dimensions
    }

    fn read(&self, domain: Option<&GridGeometry>, bands: &[usize]) -> Result<Coverage> {
        let bands = resolve_bands(bands, self.coverage.band_count())?;
        let own = &self.coverage.grid_geometry;
        let extent = *own.extent()?;

        let window = match domain.and_then(|d| d.envelope().map(|env| (d, env))) {
            Some((domain, envelope)) => {
                let area = reproject(self.factory.as_ref(), &envelope, &domain.crs, &own.crs, self.densify)?
                    .ok_or_else(|| {
                        MosaicError::disjoint_domain(format!("{envelope:?} has no image in {}", own.crs))
                    })?;
                own.subgrid(&area, 0)?
                    .and_then(|g| g.extent)
                    .ok_or_else(|| MosaicError::disjoint_domain(format!("{area:?} misses {extent:?}")))?
            }
            None => extent,
        };

        let buffer = self
            .coverage
            .buffer
            .window(
                (window.x_min - extent.x_min) as usize,
                (window.y_min - extent.y_min) as usize,
                window.width(),
                window.height(),
            )?
            .select_bands(&bands)?;
        let sample_dimensions = bands
            .iter()
            .map(|&b| self.coverage.sample_dimensions[b].clone())
            .collect();

        tracing::trace!(
            window = ?window,
            bands = bands.len(),
            "Read {}x{} pixels from memory",
            window.width(),
            window.height()
        );

        Coverage::new(own.with_extent(window), buffer, sample_dimensions)
    }
}
