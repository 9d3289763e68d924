use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// A WGS84 (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting NaN and out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            bail!("latitude {lat} is outside [-90, 90]");
        }
        if !(-180.0..=180.0).contains(&lon) {
            bail!("longitude {lon} is outside [-180, 180]");
        }
        Ok(Self { lat, lon })
    }

    /// The same location as a planar point (x = lon, y = lat).
    #[inline]
    pub fn to_point(self) -> geo::Point<f64> { geo::Point::new(self.lon, self.lat) }
}

impl FromStr for Coordinate {
    type Err = anyhow::Error;

    /// Parse `"lat,lon"`.
    fn from_str(s: &str) -> Result<Self> {
        let (lat, lon) = s.split_once(',')
            .with_context(|| format!("expected LAT,LON but got {s:?}"))?;
        let lat = lat.trim().parse::<f64>()
            .with_context(|| format!("invalid latitude in {s:?}"))?;
        let lon = lon.trim().parse::<f64>()
            .with_context(|| format!("invalid longitude in {s:?}"))?;
        Self::new(lat, lon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

/// Scalar value attached to a polygon record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Number(f64),
    Text(String),
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Number(n) => write!(f, "{n}"),
            Attribute::Text(s) => f.write_str(s),
        }
    }
}

/// One point to evaluate. `coordinate` is `None` when geocoding found nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub label: String,
    pub coordinate: Option<Coordinate>,
}

impl Query {
    pub fn new(label: impl Into<String>, coordinate: Option<Coordinate>) -> Self {
        Self { label: label.into(), coordinate }
    }
}

/// Outcome for one (query, layer) cell of a result record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum LayerValue {
    /// The point lies in a band carrying this value.
    Inside(Attribute),
    /// The layer loaded, but no band contains the point.
    Outside,
    /// The layer tag is absent from the archive.
    LayerUnavailable,
    /// The query had no coordinate.
    CoordinatesUnavailable,
}

impl fmt::Display for LayerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerValue::Inside(attribute) => write!(f, "{attribute}"),
            LayerValue::Outside => f.write_str("Fall Outside the Path"),
            LayerValue::LayerUnavailable => f.write_str("Layer unavailable"),
            LayerValue::CoordinatesUnavailable => f.write_str("Unable to fetch coordinates"),
        }
    }
}

/// One output row: the query label, its coordinate, and one value per requested layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub label: String,
    pub coordinate: Option<Coordinate>,
    pub values: Vec<(String, LayerValue)>,
}

impl ResultRecord {
    /// Value for `tag`, if that layer was requested.
    pub fn value(&self, tag: &str) -> Option<&LayerValue> {
        self.values.iter()
            .find(|(layer, _)| layer == tag)
            .map(|(_, value)| value)
    }
}
