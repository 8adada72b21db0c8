//! Common types shared by the tile mosaic workspace.
//!
//! Everything here is an immutable value: envelopes, coordinate reference
//! systems, pixel extents, grid-to-space transforms and the grid geometries
//! built from them.

pub mod crs;
pub mod envelope;
pub mod error;
pub mod grid;
pub mod sample;

pub use crs::{Crs, CrsCode, CrsParseError};
pub use envelope::Envelope;
pub use error::{GeometryError, GeometryResult};
pub use grid::{AffineTransform, GridExtent, GridGeometry};
pub use sample::SampleDimension;
