//! Error types for tile aggregation.

use projection::ProjectionError;
use raster_common::GeometryError;
use thiserror::Error;

/// Errors that can occur while building or reading aggregated resources.
#[derive(Error, Debug)]
pub enum MosaicError {
    /// No member resources were supplied.
    #[error("no member resources supplied")]
    NoResources,

    /// The requested domain does not intersect the resource footprint.
    #[error("requested domain is disjoint from the resource: {0}")]
    DisjointDomain(String),

    /// A coordinate operation could not be found or applied.
    #[error("coordinate operation failed: {0}")]
    Projection(#[from] ProjectionError),

    /// A grid geometry could not be used (singular transform, missing extent...).
    #[error("invalid grid geometry: {0}")]
    InvalidGeometry(String),

    /// Contributing tiles cannot be merged band by band.
    #[error("incompatible sample dimensions: {0}")]
    IncompatibleSampleDimensions(String),

    /// A requested band does not exist.
    #[error("band {band} out of range (resource has {count} bands)")]
    InvalidBand { band: usize, count: usize },

    /// A member resource failed to read.
    #[error("failed to read resource: {0}")]
    ReadFailed(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MosaicError {
    /// Create a DisjointDomain error.
    pub fn disjoint_domain(msg: impl Into<String>) -> Self {
        Self::DisjointDomain(msg.into())
    }

    /// Create an InvalidGeometry error.
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// True for the recoverable "nothing here" condition.
    pub fn is_disjoint(&self) -> bool {
        matches!(self, Self::DisjointDomain(_))
    }
}

impl From<GeometryError> for MosaicError {
    fn from(err: GeometryError) -> Self {
        Self::InvalidGeometry(err.to_string())
    }
}

/// Result type for mosaic operations.
pub type Result<T> = std::result::Result<T, MosaicError>;
