//! The stored market data record

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One ingested data point, as persisted in the `stockdata` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Assigned by the store on insert, never sent by clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub datatype: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub datetime: String,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub startprice: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub highestprice: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub lowestprice: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub endprice: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub volume: f64,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
}

/// Columns a page can be ordered by.
pub const SORTABLE_COLUMNS: [&str; 12] = [
    "id",
    "datatype",
    "symbol",
    "datetime",
    "startprice",
    "highestprice",
    "lowestprice",
    "endprice",
    "volume",
    "source",
    "type",
    "currency",
];

impl StockRecord {
    /// Returns the value of a scalar column by its stored name.
    pub fn column(&self, name: &str) -> Option<Value> {
        let text = |v: &Option<String>| v.clone().map(Value::String);
        match name {
            "id" => self.id.map(Value::from),
            "datatype" => Some(Value::String(self.datatype.clone())),
            "symbol" => text(&self.symbol),
            "datetime" => Some(Value::String(self.datetime.clone())),
            "startprice" => Some(Value::from(self.startprice)),
            "highestprice" => Some(Value::from(self.highestprice)),
            "lowestprice" => Some(Value::from(self.lowestprice)),
            "endprice" => Some(Value::from(self.endprice)),
            "volume" => Some(Value::from(self.volume)),
            "source" => text(&self.source),
            "type" => text(&self.kind),
            "currency" => text(&self.currency),
            _ => None,
        }
    }

    /// Text value of a searchable column.
    pub fn text_column(&self, name: &str) -> Option<&str> {
        match name {
            "symbol" => self.symbol.as_deref(),
            "datatype" => Some(self.datatype.as_str()),
            "source" => self.source.as_deref(),
            "type" => self.kind.as_deref(),
            "currency" => self.currency.as_deref(),
            _ => None,
        }
    }
}

// Rows written before the numeric columns were made non-null come back as null.
fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
