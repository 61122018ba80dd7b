//! Record store abstractions and query shapes

use crate::core::record::StockRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// Table the records live in unless configured otherwise.
pub const DEFAULT_TABLE: &str = "stockdata";

/// Columns a search term is matched against, any of which may match.
pub const SEARCH_FIELDS: [&str; 5] = ["symbol", "datatype", "source", "type", "currency"];

/// A failure reported by the underlying datastore, carrying its own message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` in any case selects descending; everything else is ascending.
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s {
            Some(s) if s.trim().eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub order: SortOrder,
}

/// Case-insensitive substring search across [`SEARCH_FIELDS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn search(term: &str) -> Self {
        Self {
            search: Some(term.to_string()),
        }
    }

    pub fn matches(&self, record: &StockRecord) -> bool {
        let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) else {
            return true;
        };
        let needle = term.to_lowercase();
        SEARCH_FIELDS.iter().any(|field| {
            record
                .text_column(field)
                .is_some_and(|value| value.to_lowercase().contains(&needle))
        })
    }
}

/// Inclusive zero-based offset range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: u64,
    pub end: u64,
}

impl Window {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub rows: Vec<StockRecord>,
    pub match_count: u64,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts the whole batch in one call.
    async fn insert(&self, records: &[StockRecord]) -> Result<(), StoreError>;

    async fn query(
        &self,
        filter: &RecordFilter,
        sort: Option<&SortSpec>,
        window: Window,
    ) -> Result<QueryPage, StoreError>;

    /// Non-null currencies across all rows, first-seen order, no duplicates.
    async fn distinct_currencies(&self) -> Result<Vec<String>, StoreError>;
}

/// Drops repeated values, keeping the first occurrence of each.
pub fn dedup_first_seen<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(symbol: &str, currency: Option<&str>) -> StockRecord {
        serde_json::from_value(json!({
            "datatype": "Candles",
            "symbol": symbol,
            "datetime": "2024-01-01T00:00:00Z",
            "source": "binance",
            "currency": currency,
        }))
        .unwrap()
    }

    #[test]
    fn test_filter_matches_any_field_case_insensitive() {
        let btc = record("BTCUSDT", Some("USDT"));

        assert!(RecordFilter::default().matches(&btc));
        assert!(RecordFilter::search("").matches(&btc));
        assert!(RecordFilter::search("btc").matches(&btc));
        assert!(RecordFilter::search("candle").matches(&btc));
        assert!(RecordFilter::search("BINANCE").matches(&btc));
        assert!(!RecordFilter::search("eth").matches(&btc));
        assert!(!RecordFilter::search("eur").matches(&record("BTCUSDT", None)));
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!(SortOrder::parse_lenient(None), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::Desc.to_string(), "desc");
    }

    #[test]
    fn test_dedup_first_seen() {
        let values = ["USD", "EUR", "USD", "INR", "EUR"].map(String::from);
        assert_eq!(dedup_first_seen(values), vec!["USD", "EUR", "INR"]);
    }

    #[test]
    fn test_window_len() {
        let window = Window { start: 20, end: 39 };
        assert_eq!(window.len(), 20);
        assert!(!window.is_empty());
    }
}
