//! From a flat list of resources to one queryable resource.

use std::sync::Arc;

use projection::{OperationFactory, StandardOperationFactory};
use raster_common::Crs;
use rayon::ThreadPool;

use crate::config::MosaicConfig;
use crate::error::{MosaicError, Result};
use crate::region::RegionCalculator;
use crate::resource::{AggregatedResource, MosaickedResource, RasterResource};

/// Builds the resource hierarchy for a set of member resources.
///
/// Members are grouped by grid. Groups of one pass through unchanged,
/// larger groups become a [`MosaickedResource`], and several results are
/// combined into one [`AggregatedResource`].
pub struct CoverageAssembler {
    factory: Arc<dyn OperationFactory>,
    config: MosaicConfig,
    crs: Option<Crs>,
    pool: Option<Arc<ThreadPool>>,
}

impl CoverageAssembler {
    pub fn new() -> Self {
        Self {
            factory: Arc::new(StandardOperationFactory::new()),
            config: MosaicConfig::default(),
            crs: None,
            pool: None,
        }
    }

    pub fn with_factory(mut self, factory: Arc<dyn OperationFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_config(mut self, config: MosaicConfig) -> Self {
        self.config = config;
        self
    }

    /// Working CRS of the top-level aggregate, when one is needed.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Pool handed to every mosaic and aggregate built here.
    pub fn with_pool(mut self, pool: Option<Arc<ThreadPool>>) -> Self {
        self.pool = pool;
        self
    }

    pub fn assemble(&self, resources: Vec<Arc<dyn RasterResource>>) -> Result<Arc<dyn RasterResource>> {
        if resources.is_empty() {
            return Err(MosaicError::NoResources);
        }
        self.config.validate()?;

        let mut calculator = RegionCalculator::with_config(self.config.clone());
        for resource in resources {
            calculator.add(resource);
        }

        let mut parts: Vec<Arc<dyn RasterResource>> = Vec::new();
        for group in calculator.finish()? {
            if group.is_singleton() {
                parts.extend(group.tiles.into_iter().map(|tile| tile.resource));
                continue;
            }
            let mosaic = MosaickedResource::with_options(
                group.grid_geometry,
                group.tiles,
                self.factory.clone(),
                self.config.clone(),
            )?
            .with_pool(self.pool.clone());
            parts.push(Arc::new(mosaic));
        }

        tracing::debug!(parts = parts.len(), "Assembled resource parts");

        if parts.len() == 1 {
            return parts.pop().ok_or(MosaicError::NoResources);
        }

        let mut builder = AggregatedResource::builder(parts)
            .with_factory(self.factory.clone())
            .with_config(self.config.clone())
            .with_pool(self.pool.clone());
        if let Some(crs) = self.crs {
            builder = builder.with_crs(crs);
        }
        Ok(Arc::new(builder.build()?))
    }
}

impl Default for CoverageAssembler {
    fn default() -> Self {
        Self::new()
    }
}
