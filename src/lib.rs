#![doc = "Riskband: point-in-band lookups against hazard probability contour layers"]
mod common;
mod config;
mod error;
mod evaluate;
mod fetch;
mod geocode;
mod geom;
mod layer;
mod resolve;
mod types;

#[cfg(test)]
mod test_support;

#[doc(inline)]
pub use common::HttpClient;

#[cfg(feature = "download")]
#[doc(inline)]
pub use common::ReqwestClient;

#[doc(inline)]
pub use config::{ArchiveSource, EngineConfig, DEFAULT_ARCHIVE_URL, DEFAULT_ATTRIBUTE_FIELD};

#[doc(inline)]
pub use error::{EngineError, Result};

#[doc(inline)]
pub use evaluate::{BatchEvaluator, BatchReport, Truncation};

#[doc(inline)]
pub use fetch::{ArchiveFetcher, ExtractedArchive};

#[doc(inline)]
pub use geocode::{geocode_queries, Geocoder};

#[cfg(feature = "download")]
#[doc(inline)]
pub use geocode::NominatimGeocoder;

#[doc(inline)]
pub use geom::{PolygonRecord, PolygonStore};

#[doc(inline)]
pub use layer::{available_layers, select_layer, DATASET_EXTENSION};

#[doc(inline)]
pub use resolve::{resolve, Resolution};

#[doc(inline)]
pub use types::{Attribute, Coordinate, LayerValue, Query, ResultRecord};
