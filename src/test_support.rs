//! Fixtures shared by unit tests: real shapefiles, real zips, and an in-memory HTTP source.

use std::{
    collections::HashMap,
    io::{Cursor, Write},
    path::{Path, PathBuf},
    sync::{atomic::{AtomicUsize, Ordering}, Mutex},
};

use geo::{MultiPolygon, Polygon, Rect};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use zip::{write::SimpleFileOptions, ZipWriter};

use crate::{common::{geo_to_shp, HttpClient}, error::{EngineError, Result}, types::Attribute};

pub(crate) const FIELD: &str = "PERCENTAGE";

/// Axis-aligned square as a MultiPolygon.
pub(crate) fn square(min_x: f64, min_y: f64, size: f64) -> MultiPolygon<f64> {
    let rect = Rect::new((min_x, min_y), (min_x + size, min_y + size));
    MultiPolygon(vec![rect.to_polygon()])
}

pub(crate) fn with_hole(outer: MultiPolygon<f64>, hole: MultiPolygon<f64>) -> MultiPolygon<f64> {
    let outer = outer.0.into_iter().next().unwrap();
    let hole = hole.0.into_iter().next().unwrap();
    MultiPolygon(vec![Polygon::new(outer.exterior().clone(), vec![hole.exterior().clone()])])
}

/// Write `<dir>/<stem>.shp` (+ .shx/.dbf) with one record per feature.
pub(crate) fn write_layer(dir: &Path, stem: &str, features: &[(MultiPolygon<f64>, Attribute)]) -> PathBuf {
    let path = dir.join(format!("{stem}.shp"));
    let name = FieldName::try_from(FIELD).unwrap();
    let numeric = matches!(features.first(), Some((_, Attribute::Number(_))));
    let table = if numeric {
        TableWriterBuilder::new().add_numeric_field(name, 10, 2)
    } else {
        TableWriterBuilder::new().add_character_field(name, 16)
    };

    {
        let mut writer = shapefile::Writer::from_path(&path, table).unwrap();
        for (shape, attribute) in features {
            let mut record = Record::default();
            let value = match attribute {
                Attribute::Number(n) => FieldValue::Numeric(Some(*n)),
                Attribute::Text(s) => FieldValue::Character(Some(s.clone())),
            };
            record.insert(FIELD.to_string(), value);
            writer.write_shape_and_record(&geo_to_shp(shape), &record).unwrap();
        }
    }
    path
}

/// Zip `(name, contents)` entries in memory.
pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Zip every file in `dir` (flat) in memory.
pub(crate) fn zip_dir(dir: &Path) -> Vec<u8> {
    let mut entries: Vec<(String, Vec<u8>)> = std::fs::read_dir(dir).unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_file())
        .map(|path| (path.file_name().unwrap().to_string_lossy().into_owned(), std::fs::read(&path).unwrap()))
        .collect();
    entries.sort();
    let refs: Vec<(&str, &[u8])> = entries.iter().map(|(n, b)| (n.as_str(), b.as_slice())).collect();
    zip_bytes(&refs)
}

/// In-memory HTTP source that counts requests per URL.
#[derive(Default)]
pub(crate) struct MockClient {
    bodies: HashMap<String, Vec<u8>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl MockClient {
    pub(crate) fn serving(url: &str, body: Vec<u8>) -> Self {
        Self { bodies: HashMap::from([(url.to_string(), body)]), ..Self::default() }
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize { self.total.load(Ordering::SeqCst) }
}

impl HttpClient for MockClient {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.bodies.get(url).cloned()
            .ok_or_else(|| EngineError::network(url, "HTTP 404 Not Found"))
    }
}
