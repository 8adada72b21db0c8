//! Aggregation of georeferenced raster tiles.
//!
//! This crate turns a set of independently produced raster resources into
//! one resource that answers read requests over any grid. It provides:
//!
//! - **Grouping**: tiles sharing one grid are gathered by the [`RegionCalculator`]
//! - **Mosaics**: a group is read as one [`MosaickedResource`]
//! - **Aggregates**: heterogeneous tiles (other CRS, other resolution) are
//!   combined into an [`AggregatedResource`]
//! - **Indexing**: tile envelopes live in an R-tree built once per resource
//! - **Threading**: reads run on the caller's thread unless a rayon pool is
//!   handed in with `with_pool`
//!
//! # Architecture
//!
//! ```text
//! Member resources
//!      │
//!      ▼
//! RegionCalculator ──► groups of tiles on one grid
//!      │
//!      ├─► single tile: passed through
//!      └─► several tiles: MosaickedResource
//!               │
//!               ▼
//!          AggregatedResource (when more than one part remains)
//!               │
//!               ▼
//! read(domain)
//!      │
//!      ├─► SpatialIndex query with the domain envelope
//!      ├─► read + resample every matching tile onto the domain
//!      └─► composite in tile index order
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tile_mosaic::{CoverageAssembler, RasterResource};
//!
//! let resource = CoverageAssembler::new().assemble(members)?;
//! let coverage = resource.read(Some(&domain), &[])?;
//! ```

pub mod assemble;
pub mod bitset;
pub mod config;
pub mod error;
pub mod index;
pub mod region;
pub mod resample;
pub mod resource;
pub mod types;

// Re-export commonly used types at crate root
pub use assemble::CoverageAssembler;
pub use bitset::BitSet2D;
pub use config::MosaicConfig;
pub use error::{MosaicError, Result};
pub use index::{IndexEntry, SpatialIndex};
pub use region::{RegionCalculator, TileGroup};
pub use resample::{
    bilinear_interpolate, cubic_interpolate, nearest_interpolate, resample, resample_on, BorderMode,
    PixelTransform,
};
pub use resource::{
    AggregatedResource, AggregatedResourceBuilder, MemoryResource, MosaickedResource, RasterResource, Tile,
};
pub use types::{Coverage, InterpolationMethod, RasterBuffer, SENTINEL};
