//! Coordinate reference system transformations.
//!
//! Operations are looked up through an [`OperationFactory`] that callers
//! construct and pass around explicitly. The standard factory implements the
//! projections it needs from scratch and accepts extra operations at runtime.

pub mod envelope;
pub mod error;
pub mod factory;
pub mod mercator;
pub mod operation;

pub use envelope::transform_envelope;
pub use error::{ProjectionError, ProjectionResult};
pub use factory::{OperationFactory, StandardOperationFactory};
pub use mercator::WebMercator;
pub use operation::{AffineOperation, CoordinateOperation, IdentityOperation};
