//! Raster resources: the queryable sources tiles are made of, and the two
//! aggregating resource kinds built on top of them.

mod aggregate;
mod memory;
mod mosaic;
mod support;

use std::fmt;
use std::sync::Arc;

use raster_common::{Envelope, GridGeometry, SampleDimension};

use crate::error::{MosaicError, Result};
use crate::types::Coverage;

pub use aggregate::{AggregatedResource, AggregatedResourceBuilder};
pub use memory::MemoryResource;
pub use mosaic::MosaickedResource;

/// A georeferenced raster that can be read over an arbitrary grid.
///
/// Implementations must be safe to read from several threads at once.
pub trait RasterResource: Send + Sync {
    /// Sampling domain of the whole resource.
    fn grid_geometry(&self) -> &GridGeometry;

    /// Description of every band, in band order.
    fn sample_dimensions(&self) -> &[SampleDimension];

    /// Georeferenced bounds in the resource's own CRS.
    fn envelope(&self) -> Option<Envelope> {
        self.grid_geometry().envelope()
    }

    /// Read the resource.
    ///
    /// # Arguments
    /// * `domain` - Grid to read over; `None` reads the whole resource
    /// * `bands` - Bands to return, in order; empty means all bands
    ///
    /// # Returns
    /// * `Coverage` holding the realized pixels and the grid they lie on
    /// * `MosaicError::DisjointDomain` when `domain` misses the resource
    fn read(&self, domain: Option<&GridGeometry>, bands: &[usize]) -> Result<Coverage>;
}

/// One member resource plus its insertion-order index.
///
/// The index is the compositing priority of an aggregated read: lower
/// indices are written first and are never overwritten.
#[derive(Clone)]
pub struct Tile {
    pub index: usize,
    pub resource: Arc<dyn RasterResource>,
}

impl Tile {
    pub fn new(index: usize, resource: Arc<dyn RasterResource>) -> Self {
        Self { index, resource }
    }

    pub fn grid_geometry(&self) -> &GridGeometry {
        self.resource.grid_geometry()
    }

    /// Number each resource by its position.
    pub fn enumerate(resources: impl IntoIterator<Item = Arc<dyn RasterResource>>) -> Vec<Tile> {
        resources
            .into_iter()
            .enumerate()
            .map(|(index, resource)| Tile::new(index, resource))
            .collect()
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("index", &self.index)
            .field("grid_geometry", self.grid_geometry())
            .finish()
    }
}

/// Expand a band selection: empty means every band.
pub(crate) fn resolve_bands(bands: &[usize], count: usize) -> Result<Vec<usize>> {
    if bands.is_empty() {
        return Ok((0..count).collect());
    }
    if let Some(&band) = bands.iter().find(|&&band| band >= count) {
        return Err(MosaicError::InvalidBand { band, count });
    }
    Ok(bands.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bands() {
        assert_eq!(resolve_bands(&[], 3).unwrap(), vec![0, 1, 2]);
        assert_eq!(resolve_bands(&[2, 0], 3).unwrap(), vec![2, 0]);
        assert!(matches!(
            resolve_bands(&[3], 3),
            Err(MosaicError::InvalidBand { band: 3, count: 3 })
        ));
    }
}
