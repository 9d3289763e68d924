use std::path::Path;

use geo::{BoundingRect, Coord, MultiPolygon, Point, Rect};
use rstar::{RTree, AABB};
use shapefile::{dbase::{FieldValue, Record}, Reader, Shape};
use tracing::debug;

use crate::{common::rings_to_geo, error::{EngineError, Result}, geom::BoundingBox, types::Attribute};

/// One band of a layer: its region and the value attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRecord {
    pub shape: MultiPolygon<f64>,
    pub attribute: Attribute,
}

/// The records of one layer in file order, with an R-tree over their bounding boxes.
#[derive(Debug, Clone)]
pub struct PolygonStore {
    records: Vec<PolygonRecord>,
    rtree: RTree<BoundingBox>,
}

impl PolygonStore {
    /// Index `records`. Index order (used for tie-breaking) is the order given.
    pub fn new(records: Vec<PolygonRecord>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                records.iter().enumerate()
                    .filter_map(|(i, record)| record.shape.bounding_rect().map(|bbox| BoundingBox::new(i, bbox)))
                    .collect()
            ),
            records,
        }
    }

    /// Load every record of the shapefile at `path`, reading the band value from `attribute_field`.
    ///
    /// Fails with [`EngineError::Dataset`] if the file cannot be read, holds a
    /// non-polygon shape, lacks the attribute, uses a projected CRS, or has no records.
    pub fn load(path: &Path, attribute_field: &str) -> Result<Self> {
        ensure_geographic_crs(path)?;

        let mut reader = Reader::from_path(path)
            .map_err(|e| EngineError::dataset(path, format!("failed to open shapefile: {e}")))?;

        let mut records = Vec::new();
        for (i, result) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = result
                .map_err(|e| EngineError::dataset(path, format!("error reading record {i}: {e}")))?;

            let shape = match shape {
                Shape::Polygon(polygon) => rings_to_geo(polygon.rings()),
                Shape::PolygonM(polygon) => rings_to_geo(polygon.rings()),
                Shape::PolygonZ(polygon) => rings_to_geo(polygon.rings()),
                Shape::NullShape => continue,
                other => return Err(EngineError::dataset(path,
                    format!("record {i} is a {:?} shape, expected Polygon", other.shapetype()))),
            };

            let attribute = read_attribute(&record, attribute_field)
                .map_err(|reason| EngineError::dataset(path, format!("record {i}: {reason}")))?;

            records.push(PolygonRecord { shape, attribute });
        }

        if records.is_empty() {
            return Err(EngineError::dataset(path, "layer contains no polygon records"));
        }

        debug!(path = %path.display(), records = records.len(), "[load] polygon layer loaded");
        Ok(Self::new(records))
    }

    /// Get the number of records.
    #[inline] pub fn len(&self) -> usize { self.records.len() }

    /// Check if there are no records.
    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Get a reference to the records, in index order.
    #[inline] pub fn records(&self) -> &[PolygonRecord] { &self.records }

    /// Indices of records whose bounding box contains `point` (boundary included), ascending.
    pub fn candidates(&self, point: Point<f64>) -> Vec<usize> {
        let mut hits: Vec<usize> = self.rtree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x(), point.y()]))
            .map(BoundingBox::idx)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Compute the bounding rectangle of all records.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.records.iter()
            .filter_map(|record| record.shape.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            ))
    }
}

/// Get the band value from a record
fn read_attribute(record: &Record, field: &str) -> std::result::Result<Attribute, String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Ok(Attribute::Text(s.trim().to_string())),
        Some(FieldValue::Numeric(Some(n))) => Ok(Attribute::Number(*n)),
        Some(FieldValue::Float(Some(f))) => Ok(Attribute::Number(f64::from(*f))),
        Some(FieldValue::Integer(i)) => Ok(Attribute::Number(f64::from(*i))),
        Some(FieldValue::Double(d)) => Ok(Attribute::Number(*d)),
        Some(other) => Err(format!("field {field:?} is null or not a scalar: {other:?}")),
        None => {
            let mut fields: Vec<String> = record.clone().into_iter().map(|(name, _)| name).collect();
            fields.sort();
            Err(format!("missing field {field:?} (available: {})", fields.join(", ")))
        }
    }
}

/// Leading WKT keywords of a projected CRS (WKT1, then WKT2 and its long form).
const PROJECTED_WKT_KEYWORDS: [&str; 3] = ["PROJCS", "PROJCRS", "PROJECTEDCRS"];

/// Containment runs in the dataset's own frame, so reject projected CRSs.
/// A missing `.prj` is taken as lon/lat.
fn ensure_geographic_crs(path: &Path) -> Result<()> {
    for ext in ["prj", "PRJ"] {
        let prj = path.with_extension(ext);
        if !prj.is_file() { continue }

        let wkt = std::fs::read_to_string(&prj)
            .map_err(|e| EngineError::dataset(path, format!("failed to read {}: {e}", prj.display())))?;
        let wkt = wkt.trim_start().to_ascii_uppercase();
        if PROJECTED_WKT_KEYWORDS.iter().any(|keyword| wkt.starts_with(keyword)) {
            return Err(EngineError::dataset(path, "projected coordinate systems are not supported, expected geographic lon/lat"));
        }
        return Ok(());
    }
    Ok(())
}
