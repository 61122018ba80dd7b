use crate::core::record::StockRecord;
use crate::core::store::{
    QueryPage, RecordFilter, RecordStore, SortOrder, SortSpec, StoreError, Window,
    dedup_first_seen,
};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

struct Table {
    rows: Vec<StockRecord>,
    next_id: i64,
}

/// In-process record table with the same search, sort and window rules as the
/// hosted store.
pub struct MemoryStore {
    inner: Arc<Mutex<Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Table {
                rows: Vec::new(),
                next_id: 1,
            })),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// Nulls sort after values ascending and before them descending.
fn compare_column(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, records: &[StockRecord]) -> Result<(), StoreError> {
        let mut table = self.inner.lock().await;
        for record in records {
            let mut row = record.clone();
            row.id = Some(table.next_id);
            table.next_id += 1;
            table.rows.push(row);
        }
        debug!("Memory store INSERT {} rows", records.len());
        Ok(())
    }

    async fn query(
        &self,
        filter: &RecordFilter,
        sort: Option<&SortSpec>,
        window: Window,
    ) -> Result<QueryPage, StoreError> {
        let table = self.inner.lock().await;
        let mut matched: Vec<&StockRecord> =
            table.rows.iter().filter(|row| filter.matches(row)).collect();

        if let Some(sort) = sort {
            matched.sort_by(|a, b| {
                let ordering = compare_column(
                    a.column(&sort.column).as_ref(),
                    b.column(&sort.column).as_ref(),
                );
                match sort.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let match_count = matched.len() as u64;
        let rows = matched
            .into_iter()
            .skip(usize::try_from(window.start).unwrap_or(usize::MAX))
            .take(usize::try_from(window.len()).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        debug!("Memory store QUERY matched {match_count} rows");

        Ok(QueryPage { rows, match_count })
    }

    async fn distinct_currencies(&self) -> Result<Vec<String>, StoreError> {
        let table = self.inner.lock().await;
        Ok(dedup_first_seen(
            table.rows.iter().filter_map(|row| row.currency.clone()),
        ))
    }
}
