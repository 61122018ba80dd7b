//! Paginated, searchable reads over the record store

use crate::core::error::{LookupError, QueryError};
use crate::core::record::{SORTABLE_COLUMNS, StockRecord};
use crate::core::store::{RecordFilter, RecordStore, SortOrder, SortSpec, Window};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query string parameters as received, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReadParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search_query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadParams {
    pub page: u32,
    pub page_size: u32,
    pub search_query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl Default for ReadParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            search_query: None,
            sort_by: None,
            sort_order: SortOrder::Asc,
        }
    }
}

impl ReadParams {
    /// Unparseable or non-positive numbers fall back to the defaults; blank
    /// strings count as absent.
    pub fn from_raw(raw: &RawReadParams) -> Self {
        let non_blank = |s: &Option<String>| s.clone().filter(|s| !s.trim().is_empty());
        Self {
            page: parse_positive(raw.page.as_deref()).unwrap_or(DEFAULT_PAGE),
            page_size: parse_positive(raw.page_size.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE),
            search_query: non_blank(&raw.search_query),
            sort_by: non_blank(&raw.sort_by),
            sort_order: SortOrder::parse_lenient(raw.sort_order.as_deref()),
        }
    }

    pub fn window(&self) -> Window {
        let start = u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size);
        Window {
            start,
            end: start + u64::from(self.page_size) - 1,
        }
    }

    fn sort_spec(&self) -> Result<Option<SortSpec>, QueryError> {
        match &self.sort_by {
            None => Ok(None),
            Some(column) if SORTABLE_COLUMNS.contains(&column.as_str()) => Ok(Some(SortSpec {
                column: column.clone(),
                order: self.sort_order,
            })),
            Some(column) => Err(QueryError::UnknownSortField(column.clone())),
        }
    }
}

/// Reads the leading integer of `s`, ignoring any trailing characters.
fn parse_positive(s: Option<&str>) -> Option<u32> {
    let s = s?.trim_start();
    let digits_end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '+' || *c == '-'))))
        .map_or(s.len(), |(i, _)| i);
    s[..digits_end].parse::<i64>().ok().and_then(|n| {
        u32::try_from(n).ok().filter(|n| *n >= 1)
    })
}

/// The response body of a page read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    pub data: Vec<StockRecord>,
    pub total_records: u64,
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyList {
    pub currencies: Vec<String>,
}

pub struct QueryService {
    store: Arc<dyn RecordStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn read_data(&self, params: &ReadParams) -> Result<PageEnvelope, QueryError> {
        let sort = params.sort_spec()?;
        let filter = RecordFilter {
            search: params.search_query.clone(),
        };
        let window = params.window();
        debug!(?filter, ?sort, ?window, "Reading page");

        let page = self.store.query(&filter, sort.as_ref(), window).await?;

        Ok(PageEnvelope {
            data: page.rows,
            total_records: page.match_count,
            current_page: params.page,
            page_size: params.page_size,
            total_pages: page.match_count.div_ceil(u64::from(params.page_size)),
        })
    }

    pub async fn available_currencies(&self) -> Result<CurrencyList, LookupError> {
        match self.store.distinct_currencies().await {
            Ok(currencies) => Ok(CurrencyList { currencies }),
            Err(e) => {
                error!(error = %e, "Failed to fetch available currencies");
                Err(LookupError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{QueryPage, StoreError};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct QueryCall {
        filter: RecordFilter,
        sort: Option<SortSpec>,
        window: Window,
    }

    /// Answers every query with a fixed count and records the arguments.
    #[derive(Default)]
    struct StubStore {
        match_count: u64,
        currencies: Vec<String>,
        fail_with: Option<String>,
        calls: Mutex<Vec<QueryCall>>,
    }

    impl StubStore {
        fn failure(&self) -> Result<(), StoreError> {
            match &self.fail_with {
                Some(message) => Err(StoreError(message.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl RecordStore for StubStore {
        async fn insert(&self, _records: &[StockRecord]) -> Result<(), StoreError> {
            unimplemented!("read-only tests")
        }

        async fn query(
            &self,
            filter: &RecordFilter,
            sort: Option<&SortSpec>,
            window: Window,
        ) -> Result<QueryPage, StoreError> {
            self.calls.lock().await.push(QueryCall {
                filter: filter.clone(),
                sort: sort.cloned(),
                window,
            });
            self.failure()?;
            Ok(QueryPage {
                rows: Vec::new(),
                match_count: self.match_count,
            })
        }

        async fn distinct_currencies(&self) -> Result<Vec<String>, StoreError> {
            self.failure()?;
            Ok(self.currencies.clone())
        }
    }

    fn raw(page: &str, page_size: &str) -> RawReadParams {
        RawReadParams {
            page: Some(page.to_string()),
            page_size: Some(page_size.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_raw_defaults() {
        assert_eq!(ReadParams::from_raw(&RawReadParams::default()), ReadParams::default());

        let params = ReadParams::from_raw(&raw("abc", ""));
        assert_eq!((params.page, params.page_size), (1, 10));

        let params = ReadParams::from_raw(&raw("0", "-5"));
        assert_eq!((params.page, params.page_size), (1, 10));

        let params = ReadParams::from_raw(&raw(" 2abc", "20.5"));
        assert_eq!((params.page, params.page_size), (2, 20));
    }

    #[test]
    fn test_from_raw_blank_search_and_sort() {
        let params = ReadParams::from_raw(&RawReadParams {
            search_query: Some("  ".to_string()),
            sort_by: Some(String::new()),
            sort_order: Some("desc".to_string()),
            ..Default::default()
        });

        assert!(params.search_query.is_none());
        assert!(params.sort_by.is_none());
        assert_eq!(params.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_window_is_inclusive() {
        let params = ReadParams::from_raw(&raw("1", "10"));
        assert_eq!(params.window(), Window { start: 0, end: 9 });

        let params = ReadParams::from_raw(&raw("3", "25"));
        assert_eq!(params.window(), Window { start: 50, end: 74 });
    }

    #[tokio::test]
    async fn test_read_data_passes_window_and_sort() {
        let store = Arc::new(StubStore {
            match_count: 50,
            ..Default::default()
        });
        let service = QueryService::new(store.clone());
        let params = ReadParams {
            page: 2,
            page_size: 20,
            search_query: Some("usd".to_string()),
            sort_by: Some("endprice".to_string()),
            sort_order: SortOrder::Desc,
        };

        let envelope = service.read_data(&params).await.unwrap();

        assert_eq!(envelope.total_records, 50);
        assert_eq!(envelope.current_page, 2);
        assert_eq!(envelope.page_size, 20);
        assert_eq!(envelope.total_pages, 3);

        let calls = store.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].window, Window { start: 20, end: 39 });
        assert_eq!(calls[0].filter, RecordFilter::search("usd"));
        assert_eq!(
            calls[0].sort,
            Some(SortSpec {
                column: "endprice".to_string(),
                order: SortOrder::Desc,
            })
        );
    }

    #[tokio::test]
    async fn test_total_pages_for_empty_result() {
        let service = QueryService::new(Arc::new(StubStore::default()));

        let envelope = service.read_data(&ReadParams::default()).await.unwrap();

        assert_eq!(envelope.total_records, 0);
        assert_eq!(envelope.total_pages, 0);
        assert!(envelope.data.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_sort_field_skips_store() {
        let store = Arc::new(StubStore::default());
        let service = QueryService::new(store.clone());
        let params = ReadParams {
            sort_by: Some("metadata; drop table".to_string()),
            ..Default::default()
        };

        let err = service.read_data(&params).await.unwrap_err();

        assert!(matches!(err, QueryError::UnknownSortField(_)));
        assert!(store.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_data_propagates_store_message() {
        let service = QueryService::new(Arc::new(StubStore {
            fail_with: Some("relation \"stockdata\" does not exist".to_string()),
            ..Default::default()
        }));

        let err = service.read_data(&ReadParams::default()).await.unwrap_err();

        assert!(matches!(err, QueryError::Store(_)));
        assert_eq!(err.to_string(), "relation \"stockdata\" does not exist");
    }

    #[tokio::test]
    async fn test_available_currencies() {
        let service = QueryService::new(Arc::new(StubStore {
            currencies: vec!["USD".to_string(), "EUR".to_string()],
            ..Default::default()
        }));

        let list = service.available_currencies().await.unwrap();
        assert_eq!(list.currencies, vec!["USD", "EUR"]);
    }

    #[tokio::test]
    async fn test_available_currencies_masks_cause() {
        let service = QueryService::new(Arc::new(StubStore {
            fail_with: Some("connection refused".to_string()),
            ..Default::default()
        }));

        let err = service.available_currencies().await.unwrap_err();
        assert_eq!(err.to_string(), "An error occurred while fetching data.");
    }
}
