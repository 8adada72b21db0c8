//! Error types for grid geometry operations.

use thiserror::Error;

/// Result type alias using GeometryError.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised while building or deriving grid geometries.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("grid-to-space transform is not invertible")]
    SingularTransform,

    #[error("invalid grid extent: {0}")]
    InvalidExtent(String),

    #[error("grid geometry has no extent")]
    UndefinedExtent,
}
