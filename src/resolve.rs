use geo::Intersects;

use crate::{geom::PolygonStore, types::{Attribute, Coordinate}};

/// Result of testing one point against one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// First record (in index order) containing the point.
    Inside { index: usize, attribute: &'a Attribute },
    /// No record contains the point.
    Outside,
}

impl<'a> Resolution<'a> {
    pub fn attribute(&self) -> Option<&'a Attribute> {
        match *self {
            Resolution::Inside { attribute, .. } => Some(attribute),
            Resolution::Outside => None,
        }
    }
}

/// Find the band containing `coordinate`.
///
/// Candidates come from the R-tree and are tested exactly in ascending record
/// order; points on a boundary count as contained, so a point on an edge shared
/// by two bands resolves to the one stored first.
pub fn resolve(store: &PolygonStore, coordinate: Coordinate) -> Resolution<'_> {
    let point = coordinate.to_point();
    store.candidates(point).into_iter()
        .find(|&i| store.records()[i].shape.intersects(&point))
        .map_or(Resolution::Outside, |index| Resolution::Inside {
            index,
            attribute: &store.records()[index].attribute,
        })
}
