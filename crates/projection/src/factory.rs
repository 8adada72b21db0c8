//! Lookup of coordinate operations between reference systems.

use std::collections::HashMap;
use std::sync::Arc;

use raster_common::{Crs, CrsCode};

use crate::error::{ProjectionError, ProjectionResult};
use crate::mercator::WebMercator;
use crate::operation::{CoordinateOperation, IdentityOperation};

/// Finds the operation converting coordinates from one CRS to another.
///
/// Implementations are shared between threads and must not change their
/// answers once resources have been built on top of them.
pub trait OperationFactory: Send + Sync {
    fn find_operation(&self, from: &Crs, to: &Crs) -> ProjectionResult<Arc<dyn CoordinateOperation>>;
}

/// Factory for the reference systems the engine understands natively, plus
/// any operation registered before use.
///
/// Native operations:
/// - identical CRS: identity
/// - EPSG:4326 <-> EPSG:4269: identity (datum shift below grid resolution)
/// - geographic <-> EPSG:3857: spherical Web Mercator
#[derive(Debug, Default, Clone)]
pub struct StandardOperationFactory {
    registered: HashMap<(Crs, Crs), Arc<dyn CoordinateOperation>>,
}

impl StandardOperationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation and, when it can be inverted, its inverse.
    ///
    /// Registered operations take precedence over native ones.
    pub fn register(&mut self, operation: Arc<dyn CoordinateOperation>) -> &mut Self {
        let from = operation.source_crs();
        let to = operation.target_crs();
        if let Ok(inverse) = operation.inverse() {
            self.registered.entry((to, from)).or_insert(inverse);
        }
        self.registered.insert((from, to), operation);
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with_operation(mut self, operation: Arc<dyn CoordinateOperation>) -> Self {
        self.register(operation);
        self
    }

    fn native(from: &Crs, to: &Crs) -> Option<Arc<dyn CoordinateOperation>> {
        if from == to {
            return Some(Arc::new(IdentityOperation::same(*from)));
        }
        match (from.code, to.code) {
            (a, b) if a.is_geographic() && b.is_geographic() => {
                Some(Arc::new(IdentityOperation::new(*from, *to)))
            }
            (a, CrsCode::Epsg3857) if a.is_geographic() => Some(Arc::new(WebMercator::forward(*from))),
            (CrsCode::Epsg3857, b) if b.is_geographic() => Some(Arc::new(WebMercator::inverse_of(*to))),
            _ => None,
        }
    }
}

impl OperationFactory for StandardOperationFactory {
    fn find_operation(&self, from: &Crs, to: &Crs) -> ProjectionResult<Arc<dyn CoordinateOperation>> {
        if let Some(op) = self.registered.get(&(*from, *to)) {
            return Ok(op.clone());
        }
        if let Some(op) = Self::native(from, to) {
            return Ok(op);
        }
        tracing::debug!(from = %from, to = %to, "no coordinate operation available");
        Err(ProjectionError::NoOperationFound { from: *from, to: *to })
    }
}
