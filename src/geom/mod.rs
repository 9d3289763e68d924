mod bbox;
mod store;

use bbox::BoundingBox;
pub use store::{PolygonRecord, PolygonStore};
