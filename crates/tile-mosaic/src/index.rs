//! Spatial index over tile envelopes.

use raster_common::Envelope;
use rstar::{RTree, RTreeObject, AABB};

/// One indexed rectangle and what it stands for.
#[derive(Debug, Clone)]
pub struct IndexEntry<T> {
    pub envelope: Envelope,
    pub payload: T,
}

impl<T> RTreeObject for IndexEntry<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        to_aabb(&self.envelope)
    }
}

fn to_aabb(envelope: &Envelope) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [envelope.min_x, envelope.min_y],
        [envelope.max_x, envelope.max_y],
    )
}

/// Immutable R-tree of envelopes, bulk-loaded once.
///
/// Queries return entries whose envelope overlaps the query with positive
/// area; entries that merely share an edge with it are left out.
pub struct SpatialIndex<T> {
    tree: RTree<IndexEntry<T>>,
    bounds: Option<Envelope>,
}

impl<T> SpatialIndex<T> {
    pub fn bulk_load(entries: Vec<(Envelope, T)>) -> Self {
        let bounds = entries
            .iter()
            .map(|(envelope, _)| *envelope)
            .reduce(|a, b| a.union(&b));
        let entries = entries
            .into_iter()
            .map(|(envelope, payload)| IndexEntry { envelope, payload })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            bounds,
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Union of every indexed envelope.
    pub fn bounds(&self) -> Option<Envelope> {
        self.bounds
    }

    /// Entries overlapping `area`, in no particular order.
    pub fn query(&self, area: &Envelope) -> Vec<&IndexEntry<T>> {
        self.tree
            .locate_in_envelope_intersecting(&to_aabb(area))
            .filter(|entry| entry.envelope.intersects(area))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry<T>> {
        self.tree.iter()
    }
}
