//! Turns uploaded search-result documents into stored records

use crate::core::error::ImportError;
use crate::core::record::StockRecord;
use crate::core::store::RecordStore;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source fields mapped onto record columns. Everything else lands in `metadata`.
const KNOWN_FIELDS: [&str; 11] = [
    "symbol",
    "dateTime",
    "startPrice",
    "highestPrice",
    "lowestPrice",
    "endPrice",
    "volume",
    "source",
    "type",
    "currency",
    "candleType",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub records: usize,
}

pub struct Importer {
    store: Arc<dyn RecordStore>,
}

impl Importer {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Parses `content`, tags every record with `data_type` and inserts the
    /// batch with a single store call.
    pub async fn process_data(
        &self,
        content: &[u8],
        data_type: &str,
    ) -> Result<ImportSummary, ImportError> {
        let records = parse_document(content, data_type, Utc::now())?;
        debug!(count = records.len(), data_type, "Inserting import batch");

        self.store.insert(&records).await?;

        info!(count = records.len(), data_type, "Imported records");
        Ok(ImportSummary {
            records: records.len(),
        })
    }
}

/// Maps every hit of a document to a record. `now` fills missing timestamps.
pub fn parse_document(
    content: &[u8],
    data_type: &str,
    now: DateTime<Utc>,
) -> Result<Vec<StockRecord>, ImportError> {
    let document: Value = serde_json::from_slice(content).map_err(|e| {
        warn!(error = %e, "Rejected import document");
        ImportError::InvalidFormat
    })?;

    extract_hits(&document)?
        .iter()
        .map(|hit| transform_hit(hit, data_type, now))
        .collect()
}

/// Returns the array at `hits.hits`, empty when the path is absent.
pub fn extract_hits(document: &Value) -> Result<&[Value], ImportError> {
    match document.get("hits").and_then(|hits| hits.get("hits")) {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(hits)) => Ok(hits.as_slice()),
        Some(other) => {
            warn!(found = %type_name(other), "hits.hits is not an array");
            Err(ImportError::InvalidFormat)
        }
    }
}

pub fn transform_hit(
    hit: &Value,
    data_type: &str,
    now: DateTime<Utc>,
) -> Result<StockRecord, ImportError> {
    let Some(source) = hit.get("_source").and_then(Value::as_object) else {
        warn!("Hit without a _source object");
        return Err(ImportError::InvalidFormat);
    };

    let field = |name: &str| source.get(name).filter(|v| is_truthy(v));

    let metadata: Map<String, Value> = source
        .iter()
        .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(StockRecord {
        id: None,
        datatype: data_type.to_string(),
        symbol: source.get("symbol").and_then(text_value),
        datetime: field("dateTime")
            .map(|v| timestamp_value(v, now))
            .unwrap_or_else(|| iso_timestamp(now)),
        startprice: numeric_or_zero(field("startPrice")),
        highestprice: numeric_or_zero(field("highestPrice")),
        lowestprice: numeric_or_zero(field("lowestPrice")),
        endprice: numeric_or_zero(field("endPrice")),
        volume: numeric_or_zero(field("volume")),
        source: source.get("source").and_then(text_value),
        kind: field("type")
            .or_else(|| source.get("candleType"))
            .and_then(text_value),
        currency: source.get("currency").and_then(text_value),
        metadata,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn numeric_or_zero(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// Numeric timestamps are epoch milliseconds.
fn timestamp_value(value: &Value, now: DateTime<Utc>) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(iso_timestamp)
            .unwrap_or_else(|| iso_timestamp(now)),
        other => other.to_string(),
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
