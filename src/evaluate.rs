use std::collections::HashMap;

use tracing::{info, warn};

use crate::{
    common::HttpClient,
    config::EngineConfig,
    error::{EngineError, Result},
    fetch::ArchiveFetcher,
    geom::PolygonStore,
    layer::{available_layers, select_layer},
    resolve::{resolve, Resolution},
    types::{LayerValue, Query, ResultRecord},
};

/// Records produced by one evaluation, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub records: Vec<ResultRecord>,
    /// Set when the input exceeded `max_batch_size` and was cut.
    pub truncation: Option<Truncation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    pub submitted: usize,
    pub evaluated: usize,
}

/// Layer stores loaded for one run, keyed by tag.
#[derive(Debug, Default)]
struct LayerCache {
    layers: HashMap<String, Option<PolygonStore>>, // None: tag absent from the archive
}

impl LayerCache {
    /// Fetch the archive once and load every tag from it.
    /// The scratch directory is gone by the time this returns, on success or failure.
    fn build<C: HttpClient>(fetcher: &ArchiveFetcher<C>, config: &EngineConfig, tags: &[String]) -> Result<Self> {
        let archive = fetcher.fetch_source(&config.archive)?;

        let mut layers = HashMap::with_capacity(tags.len());
        for tag in tags {
            let store = match select_layer(archive.files(), tag) {
                Ok(path) => Some(PolygonStore::load(&path, &config.attribute_field)
                    .map_err(|e| e.with_layer(tag))?),
                Err(EngineError::LayerNotFound { .. }) => {
                    warn!(layer = %tag, available = ?available_layers(archive.files()), "layer not found in archive, reporting as unavailable");
                    None
                }
                Err(e) => return Err(e),
            };
            layers.insert(tag.clone(), store);
        }
        Ok(Self { layers })
    }

    fn value(&self, tag: &str, query: &Query) -> LayerValue {
        let Some(coordinate) = query.coordinate else {
            return LayerValue::CoordinatesUnavailable;
        };
        match self.layers.get(tag) {
            Some(Some(store)) => match resolve(store, coordinate) {
                Resolution::Inside { attribute, .. } => LayerValue::Inside(attribute.clone()),
                Resolution::Outside => LayerValue::Outside,
            },
            _ => LayerValue::LayerUnavailable,
        }
    }
}

/// Runs batches of point queries against the layers of one archive source.
pub struct BatchEvaluator<C> {
    fetcher: ArchiveFetcher<C>,
    config: EngineConfig,
}

impl<C: HttpClient> BatchEvaluator<C> {
    pub fn new(client: C, config: EngineConfig) -> Self {
        let fetcher = ArchiveFetcher::new(client).with_scratch_root(config.scratch_dir.clone());
        Self { fetcher, config }
    }

    #[inline] pub fn config(&self) -> &EngineConfig { &self.config }

    /// Resolve every query against every layer tag.
    ///
    /// Each distinct tag is loaded at most once per call, and the archive is
    /// fetched at most once, only if some query has a coordinate. A tag missing
    /// from the archive yields [`LayerValue::LayerUnavailable`] in its column;
    /// any other load failure aborts the batch. Queries beyond `max_batch_size`
    /// are dropped and reported in [`BatchReport::truncation`].
    pub fn evaluate(&self, queries: &[Query], layers: &[String]) -> Result<BatchReport> {
        let limit = self.config.max_batch_size;
        let truncation = (queries.len() > limit).then(|| {
            warn!(submitted = queries.len(), limit, "batch exceeds limit, truncating");
            Truncation { submitted: queries.len(), evaluated: limit }
        });
        let queries = &queries[..queries.len().min(limit)];

        let mut tags: Vec<String> = Vec::with_capacity(layers.len());
        for tag in layers {
            if !tags.contains(tag) { tags.push(tag.clone()) }
        }

        let needs_data = !tags.is_empty() && queries.iter().any(|query| query.coordinate.is_some());
        let cache = if needs_data {
            LayerCache::build(&self.fetcher, &self.config, &tags)?
        } else {
            LayerCache::default()
        };

        let records: Vec<ResultRecord> = queries.iter()
            .map(|query| ResultRecord {
                label: query.label.clone(),
                coordinate: query.coordinate,
                values: tags.iter().map(|tag| (tag.clone(), cache.value(tag, query))).collect(),
            })
            .collect();

        info!(records = records.len(), layers = tags.len(), "batch evaluated");
        Ok(BatchReport { records, truncation })
    }

    /// Dataset names present in the archive.
    pub fn list_layers(&self) -> Result<Vec<String>> {
        let archive = self.fetcher.fetch_source(&self.config.archive)?;
        Ok(available_layers(archive.files()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ArchiveSource,
        test_support::{square, write_layer, zip_bytes, zip_dir, MockClient, FIELD},
        types::{Attribute, Coordinate},
    };

    const URL: &str = "https://example.test/wsp_latest.zip";

    fn text(s: &str) -> Attribute { Attribute::Text(s.to_string()) }

    fn tags(tags: &[&str]) -> Vec<String> { tags.iter().map(|t| t.to_string()).collect() }

    fn point(label: &str, lat: f64, lon: f64) -> Query {
        Query::new(label, Some(Coordinate::new(lat, lon).unwrap()))
    }

    /// Archive with a 34 kt layer (two bands) and a 64 kt layer (one band around Miami).
    fn wsp_archive() -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        write_layer(dir.path(), "2024100912_wsp34knt120hr_5km", &[
            (square(-82., 24., 2.), text("90%")),
            (square(-80., 24., 2.), text("50%")),
        ]);
        write_layer(dir.path(), "2024100912_wsp64knt120hr_5km", &[
            (square(-82., 23., 4.), Attribute::Number(42.0)),
        ]);
        zip_dir(dir.path())
    }

    fn evaluator<'a>(client: &'a MockClient, scratch: &std::path::Path) -> BatchEvaluator<&'a MockClient> {
        let config = EngineConfig {
            archive: ArchiveSource::Url(URL.to_string()),
            attribute_field: FIELD.to_string(),
            scratch_dir: Some(scratch.to_path_buf()),
            ..EngineConfig::default()
        };
        BatchEvaluator::new(client, config)
    }

    fn scratch_is_empty(scratch: &std::path::Path) -> bool {
        std::fs::read_dir(scratch).unwrap().next().is_none()
    }

    #[test]
    fn populates_each_layer_column_in_input_order() {
        let client = MockClient::serving(URL, wsp_archive());
        let scratch = tempfile::tempdir().unwrap();
        let queries = vec![
            point("Miami", 25.0, -80.0),
            point("Key West", 24.5, -81.5),
            point("Atlanta", 33.7, -84.4),
        ];

        let report = evaluator(&client, scratch.path()).evaluate(&queries, &tags(&["34knt", "64knt"])).unwrap();
        assert_eq!(report.truncation, None);

        let labels: Vec<_> = report.records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["Miami", "Key West", "Atlanta"]);

        // Miami sits on the shared edge of the two 34 kt bands; the first band wins.
        assert_eq!(report.records[0].value("34knt"), Some(&LayerValue::Inside(text("90%"))));
        assert_eq!(report.records[0].value("64knt"), Some(&LayerValue::Inside(Attribute::Number(42.0))));
        assert_eq!(report.records[1].value("34knt"), Some(&LayerValue::Inside(text("90%"))));
        assert_eq!(report.records[2].value("34knt"), Some(&LayerValue::Outside));
        assert_eq!(report.records[2].value("64knt"), Some(&LayerValue::Outside));
        assert!(scratch_is_empty(scratch.path()));
    }

    #[test]
    fn missing_layer_is_unavailable_and_batch_continues() {
        let client = MockClient::serving(URL, wsp_archive());
        let scratch = tempfile::tempdir().unwrap();
        let queries = vec![point("Miami", 25.0, -80.0), point("Atlanta", 33.7, -84.4)];

        let report = evaluator(&client, scratch.path())
            .evaluate(&queries, &tags(&["34knt", "50knt", "64knt"]))
            .unwrap();

        for record in &report.records {
            assert_eq!(record.value("50knt"), Some(&LayerValue::LayerUnavailable));
        }
        assert_eq!(report.records[0].value("64knt"), Some(&LayerValue::Inside(Attribute::Number(42.0))));
        // Outside a loaded layer stays distinct from an unavailable layer.
        assert_eq!(report.records[1].value("34knt"), Some(&LayerValue::Outside));
    }

    #[test]
    fn archive_is_fetched_once_per_batch() {
        let client = MockClient::serving(URL, wsp_archive());
        let scratch = tempfile::tempdir().unwrap();
        let queries: Vec<Query> = (0..20).map(|i| point(&format!("p{i}"), 24.0 + 0.1 * i as f64, -80.5)).collect();

        evaluator(&client, scratch.path()).evaluate(&queries, &tags(&["34knt", "64knt", "34knt"])).unwrap();
        assert_eq!(client.calls(URL), 1);
    }

    #[test]
    fn duplicate_tags_produce_one_column() {
        let client = MockClient::serving(URL, wsp_archive());
        let scratch = tempfile::tempdir().unwrap();

        let report = evaluator(&client, scratch.path())
            .evaluate(&[point("Miami", 25.0, -80.0)], &tags(&["64knt", "34knt", "64knt"]))
            .unwrap();
        let columns: Vec<_> = report.records[0].values.iter().map(|(tag, _)| tag.as_str()).collect();
        assert_eq!(columns, ["64knt", "34knt"]);
    }

    #[test]
    fn ambiguous_tag_aborts_batch_and_cleans_scratch() {
        let dir = tempfile::tempdir().unwrap();
        write_layer(dir.path(), "al01_wsp64knt", &[(square(0., 0., 1.), text("5%"))]);
        write_layer(dir.path(), "al02_wsp64knt", &[(square(0., 0., 1.), text("5%"))]);
        let client = MockClient::serving(URL, zip_dir(dir.path()));
        let scratch = tempfile::tempdir().unwrap();

        let err = evaluator(&client, scratch.path())
            .evaluate(&[point("a", 0.5, 0.5)], &tags(&["64knt"]))
            .unwrap_err();
        assert!(matches!(err, EngineError::AmbiguousLayer { ref tag, ref matches } if tag == "64knt" && matches.len() == 2));
        assert!(scratch_is_empty(scratch.path()));
    }

    #[test]
    fn broken_dataset_aborts_batch_naming_layer() {
        let client = MockClient::serving(URL, zip_bytes(&[
            ("wsp34knt.shp", b"garbage".as_slice()),
            ("wsp34knt.dbf", b"garbage".as_slice()),
        ]));
        let scratch = tempfile::tempdir().unwrap();

        let err = evaluator(&client, scratch.path())
            .evaluate(&[point("a", 0.5, 0.5)], &tags(&["34knt"]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Dataset { layer: Some(ref tag), .. } if tag == "34knt"));
        assert!(scratch_is_empty(scratch.path()));
    }

    #[test]
    fn network_failure_aborts_batch() {
        let client = MockClient::default();
        let scratch = tempfile::tempdir().unwrap();
        let err = evaluator(&client, scratch.path())
            .evaluate(&[point("a", 0.5, 0.5)], &tags(&["34knt"]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Network { .. }));
    }

    #[test]
    fn empty_batch_fetches_nothing() {
        let client = MockClient::default();
        let scratch = tempfile::tempdir().unwrap();
        let report = evaluator(&client, scratch.path()).evaluate(&[], &tags(&["34knt"])).unwrap();
        assert!(report.records.is_empty());
        assert_eq!(client.total_calls(), 0);
    }

    #[test]
    fn missing_coordinates_skip_containment() {
        let client = MockClient::serving(URL, wsp_archive());
        let scratch = tempfile::tempdir().unwrap();
        let evaluator = evaluator(&client, scratch.path());

        let unresolved = vec![Query::new("nowhere street", None)];
        let report = evaluator.evaluate(&unresolved, &tags(&["34knt", "64knt"])).unwrap();
        assert_eq!(report.records[0].coordinate, None);
        assert_eq!(report.records[0].value("34knt"), Some(&LayerValue::CoordinatesUnavailable));
        assert_eq!(report.records[0].value("64knt"), Some(&LayerValue::CoordinatesUnavailable));
        assert_eq!(client.total_calls(), 0);

        let mixed = vec![Query::new("nowhere street", None), point("Miami", 25.0, -80.0)];
        let report = evaluator.evaluate(&mixed, &tags(&["50knt"])).unwrap();
        assert_eq!(report.records[0].value("50knt"), Some(&LayerValue::CoordinatesUnavailable));
        assert_eq!(report.records[1].value("50knt"), Some(&LayerValue::LayerUnavailable));
    }

    #[test]
    fn oversized_batch_is_truncated_and_reported() {
        let client = MockClient::serving(URL, wsp_archive());
        let scratch = tempfile::tempdir().unwrap();
        let queries: Vec<Query> = (0..51).map(|i| point(&format!("addr {i}"), 25.0, -80.0)).collect();

        let report = evaluator(&client, scratch.path()).evaluate(&queries, &tags(&["64knt"])).unwrap();
        assert_eq!(report.records.len(), 50);
        assert_eq!(report.truncation, Some(Truncation { submitted: 51, evaluated: 50 }));
        assert_eq!(report.records.last().unwrap().label, "addr 49");
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let client = MockClient::serving(URL, wsp_archive());
        let scratch = tempfile::tempdir().unwrap();
        let evaluator = evaluator(&client, scratch.path());
        let queries = vec![point("Miami", 25.0, -80.0), Query::new("?", None), point("Atlanta", 33.7, -84.4)];
        let layers = tags(&["34knt", "50knt", "64knt"]);

        let first = evaluator.evaluate(&queries, &layers).unwrap();
        let second = evaluator.evaluate(&queries, &layers).unwrap();
        assert_eq!(first, second);
        assert_eq!(client.calls(URL), 2);
    }

    #[test]
    fn lists_layers_in_archive() {
        let client = MockClient::serving(URL, wsp_archive());
        let scratch = tempfile::tempdir().unwrap();
        assert_eq!(
            evaluator(&client, scratch.path()).list_layers().unwrap(),
            ["2024100912_wsp34knt120hr_5km", "2024100912_wsp64knt120hr_5km"]
        );
    }
}
