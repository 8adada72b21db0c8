//! Error types for coordinate operations.

use raster_common::Crs;
use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error)]
pub enum ProjectionError {
    /// No operation relates the two reference systems.
    #[error("no coordinate operation found from {from} to {to}")]
    NoOperationFound { from: Crs, to: Crs },

    /// None of the sampled points could be transformed.
    #[error("envelope lies outside the domain of the {from} -> {to} operation")]
    OutOfDomain { from: Crs, to: Crs },

    #[error("operation is not invertible: {0}")]
    NotInvertible(String),
}
