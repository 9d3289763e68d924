use std::{fs, io::{self, Read}, path::Path};

use anyhow::{bail, Context, Result};
use riskband::{geocode_queries, BatchEvaluator, BatchReport, LayerValue, NominatimGeocoder, Query, ResultRecord};
use serde::Serialize;
use tracing::info;

use crate::{cli::{EvaluateArgs, OutputFormat}, commands::{http_client, load_config}};

pub fn run(args: &EvaluateArgs) -> Result<()> {
    let mut config = load_config(&args.source)?;
    if let Some(field) = &args.field { config.attribute_field = field.clone() }
    if let Some(limit) = args.max_batch { config.max_batch_size = limit }
    config.validate()?;

    if args.addresses.is_none() && args.points.is_empty() {
        bail!("nothing to evaluate: pass --addresses FILE and/or --point LAT,LON");
    }

    let client = http_client(&config)?;
    let mut queries: Vec<Query> = args.points.iter()
        .map(|&point| Query::new(point.to_string(), Some(point)))
        .collect();

    if let Some(path) = &args.addresses {
        let addresses = read_addresses(path)?;
        // Only geocode what the evaluator will keep; the rest still count toward the truncation report.
        let budget = config.max_batch_size.saturating_sub(queries.len()).min(addresses.len());
        info!(geocoded = budget, submitted = addresses.len(), "[geocode] resolving addresses");

        let geocoder = NominatimGeocoder::new(client.clone());
        queries.extend(geocode_queries(&geocoder, &addresses[..budget]));
        queries.extend(addresses[budget..].iter().map(|address| Query::new(address.clone(), None)));
    }

    let evaluator = BatchEvaluator::new(client, config);
    let report = evaluator.evaluate(&queries, &args.layers)
        .with_context(|| format!("evaluation aborted while loading {}", evaluator.config().archive))?;

    if let Some(truncation) = report.truncation {
        eprintln!(
            "Note: {} queries submitted, only the first {} were evaluated (limit --max-batch)",
            truncation.submitted, truncation.evaluated
        );
    }

    match args.format {
        OutputFormat::Table => print!("{}", render_table(&report.records, &args.layers)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }
    Ok(())
}

/// Non-blank, trimmed lines of `path` ("-" for stdin).
fn read_addresses(path: &Path) -> Result<Vec<String>> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).context("read addresses from stdin")?;
        text
    } else {
        fs::read_to_string(path).with_context(|| format!("read addresses from {}", path.display()))?
    };
    Ok(text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Aligned text table: address, latitude, longitude, then one column per layer.
fn render_table(records: &[ResultRecord], layers: &[String]) -> String {
    let mut header: Vec<String> = vec!["Address".into(), "Latitude".into(), "Longitude".into()];
    let mut columns: Vec<&String> = Vec::new();
    for layer in layers {
        if !columns.contains(&layer) { columns.push(layer) }
    }
    header.extend(columns.iter().map(|layer| layer.to_string()));

    let rows: Vec<Vec<String>> = records.iter()
        .map(|record| {
            let (lat, lon) = match record.coordinate {
                Some(c) => (format!("{:.6}", c.lat), format!("{:.6}", c.lon)),
                None => ("N/A".to_string(), "N/A".to_string()),
            };
            let mut row = vec![record.label.clone(), lat, lon];
            row.extend(columns.iter().map(|layer| {
                record.value(layer).map(LayerValue::to_string).unwrap_or_default()
            }));
            row
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| std::iter::once(&header).chain(&rows).map(|row| row[i].chars().count()).max().unwrap_or(0))
        .collect();

    let format_row = |row: &[String]| -> String {
        let cells: Vec<String> = row.iter().zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        format!("{}\n", cells.join("  ").trim_end())
    };

    let mut out = format_row(header.as_slice());
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&format_row(rule.as_slice()));
    for row in &rows {
        out.push_str(&format_row(row.as_slice()));
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    records: Vec<JsonRecord<'a>>,
    submitted: usize,
    evaluated: usize,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    address: &'a str,
    latitude: Option<f64>,
    longitude: Option<f64>,
    layers: serde_json::Map<String, serde_json::Value>,
}

fn render_json(report: &BatchReport) -> Result<String> {
    let records = report.records.iter()
        .map(|record| {
            let layers = record.values.iter()
                .map(|(tag, value)| Ok((tag.clone(), serde_json::to_value(value)?)))
                .collect::<Result<serde_json::Map<_, _>>>()?;
            Ok(JsonRecord {
                address: &record.label,
                latitude: record.coordinate.map(|c| c.lat),
                longitude: record.coordinate.map(|c| c.lon),
                layers,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let evaluated = report.records.len();
    let submitted = report.truncation.map_or(evaluated, |t| t.submitted);
    Ok(serde_json::to_string_pretty(&JsonReport { records, submitted, evaluated })?)
}
