//! Table browsing state and its transitions
//!
//! Every user action produces a new [`TableFilter`] together with the request
//! that must be fetched for it. Responses are applied to a [`TableView`] only
//! if they belong to the most recent request.

use crate::core::query::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, PageEnvelope};
use crate::core::{SortOrder, StockRecord};
use serde::Serialize;

pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 50, 100, 200];

/// Query parameters sent to `GET /data-import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Go to a 1-based page.
    ChangePage(u32),
    ChangePageSize(u32),
    /// Sort by a column, flipping the direction if it is already ascending on it.
    ToggleSort(String),
    Search(String),
    SelectCurrency(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFilter {
    pub page: u32,
    pub page_size: u32,
    pub search_query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl Default for TableFilter {
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub filter: TableFilter,
    pub fetch: FetchRequest,
}

impl TableFilter {
    pub fn request(&self) -> FetchRequest {
        FetchRequest {
            page: self.page,
            page_size: self.page_size,
            search_query: self.search_query.clone(),
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
        }
    }

    pub fn apply(&self, action: Action) -> Transition {
        let mut next = self.clone();
        match action {
            Action::ChangePage(page) => next.page = page.max(1),
            Action::ChangePageSize(size) => {
                next.page_size = size.max(1);
                next.page = 1;
            }
            Action::ToggleSort(column) => {
                let ascending_here =
                    self.sort_by.as_deref() == Some(column.as_str()) && self.sort_order == SortOrder::Asc;
                next.sort_order = if ascending_here {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                };
                next.sort_by = Some(column);
            }
            Action::Search(query) | Action::SelectCurrency(query) => {
                next.search_query = Some(query).filter(|q| !q.is_empty());
                next.page = 1;
            }
        }
        Transition {
            fetch: next.request(),
            filter: next,
        }
    }

    pub fn total_pages(&self, total_records: u64) -> u64 {
        total_records.div_ceil(u64::from(self.page_size))
    }
}

/// What the browser shows: the current filter and the rows fetched for it.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    pub filter: TableFilter,
    pub rows: Vec<StockRecord>,
    pub total_records: u64,
    pub currencies: Vec<String>,
    generation: u64,
}

impl TableView {
    pub fn new(filter: TableFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Moves to the transition's filter and returns the generation its fetch
    /// must be tagged with.
    pub fn begin(&mut self, transition: &Transition) -> u64 {
        self.filter = transition.filter.clone();
        self.generation += 1;
        self.generation
    }

    /// Applies a fetched page unless a newer request has started since.
    pub fn receive(&mut self, generation: u64, envelope: PageEnvelope) -> bool {
        if generation != self.generation {
            return false;
        }
        self.rows = envelope.data;
        self.total_records = envelope.total_records;
        true
    }

    pub fn find(&self, id: i64) -> Option<&StockRecord> {
        self.rows.iter().find(|row| row.id == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(symbols: &[&str], total: u64) -> PageEnvelope {
        PageEnvelope {
            data: symbols
                .iter()
                .enumerate()
                .map(|(i, s)| StockRecord {
                    id: Some(i as i64 + 1),
                    datatype: "Candles".to_string(),
                    symbol: Some(s.to_string()),
                    datetime: "2024-01-01T00:00:00.000Z".to_string(),
                    startprice: 0.0,
                    highestprice: 0.0,
                    lowestprice: 0.0,
                    endprice: 0.0,
                    volume: 0.0,
                    source: None,
                    kind: None,
                    currency: None,
                    metadata: Default::default(),
                })
                .collect(),
            total_records: total,
            current_page: 1,
            page_size: 10,
            total_pages: total.div_ceil(10),
        }
    }

    #[test]
    fn test_change_page_keeps_other_settings() {
        let filter = TableFilter {
            search_query: Some("usd".to_string()),
            ..Default::default()
        };

        let t = filter.apply(Action::ChangePage(3));

        assert_eq!(t.filter.page, 3);
        assert_eq!(t.fetch.page, 3);
        assert_eq!(t.fetch.search_query.as_deref(), Some("usd"));
        assert_eq!(filter.page, 1);
    }

    #[test]
    fn test_change_page_size_resets_page() {
        let filter = TableFilter {
            page: 4,
            ..Default::default()
        };

        let t = filter.apply(Action::ChangePageSize(50));

        assert_eq!((t.filter.page, t.filter.page_size), (1, 50));
    }

    #[test]
    fn test_toggle_sort() {
        let filter = TableFilter::default();

        let first = filter.apply(Action::ToggleSort("symbol".to_string()));
        assert_eq!(first.filter.sort_by.as_deref(), Some("symbol"));
        assert_eq!(first.filter.sort_order, SortOrder::Asc);

        let second = first.filter.apply(Action::ToggleSort("symbol".to_string()));
        assert_eq!(second.filter.sort_order, SortOrder::Desc);

        let third = second.filter.apply(Action::ToggleSort("symbol".to_string()));
        assert_eq!(third.filter.sort_order, SortOrder::Asc);

        let other = second.filter.apply(Action::ToggleSort("currency".to_string()));
        assert_eq!(other.filter.sort_by.as_deref(), Some("currency"));
        assert_eq!(other.filter.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_search_and_currency_reset_page() {
        let filter = TableFilter {
            page: 5,
            page_size: 50,
            ..Default::default()
        };

        let t = filter.apply(Action::Search("btc".to_string()));
        assert_eq!(t.filter.page, 1);
        assert_eq!(t.filter.page_size, 50);
        assert_eq!(t.fetch.search_query.as_deref(), Some("btc"));

        let t = t.filter.apply(Action::SelectCurrency("EUR".to_string()));
        assert_eq!(t.filter.search_query.as_deref(), Some("EUR"));

        let t = t.filter.apply(Action::Search(String::new()));
        assert!(t.filter.search_query.is_none());
    }

    #[test]
    fn test_fetch_request_query_shape() {
        let t = TableFilter::default().apply(Action::ToggleSort("endprice".to_string()));
        let value = serde_json::to_value(&t.fetch).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "page": 1,
                "pageSize": 10,
                "sortBy": "endprice",
                "sortOrder": "asc"
            })
        );
    }

    #[test]
    fn test_stale_responses_are_dropped() {
        let mut view = TableView::default();

        let first = view.begin(&view.filter.apply(Action::Search("b".to_string())));
        let second = view.begin(&view.filter.apply(Action::Search("btc".to_string())));

        assert!(!view.receive(first, envelope(&["BNB", "BTC"], 2)));
        assert!(view.rows.is_empty());

        assert!(view.receive(second, envelope(&["BTC"], 1)));
        assert_eq!(view.total_records, 1);
        assert_eq!(view.filter.search_query.as_deref(), Some("btc"));
        assert_eq!(view.find(1).and_then(|r| r.symbol.as_deref()), Some("BTC"));
        assert_eq!(view.filter.total_pages(view.total_records), 1);
    }
}
