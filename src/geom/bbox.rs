use geo::Rect;
use rstar::{RTreeObject, AABB};

/// R-tree entry for one polygon record. `idx` is the record's position in the
/// store, which is also the order containment ties are broken in.
#[derive(Debug, Clone)]
pub(super) struct BoundingBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(super) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Get the index of the corresponding record.
    pub(super) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}
