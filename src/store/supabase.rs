use crate::core::record::StockRecord;
use crate::core::store::{
    QueryPage, RecordFilter, RecordStore, SEARCH_FIELDS, SortSpec, StoreError, Window,
    dedup_first_seen,
};
use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

pub use crate::core::store::DEFAULT_TABLE;

/// Record store backed by the PostgREST API of a hosted Supabase project.
pub struct SupabaseStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CurrencyRow {
    currency: Option<String>,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stockdata/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turns a non-success response into the store's own error message.
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<PostgrestError>(&body)
            .map(|e| e.message)
            .unwrap_or_else(|_| format!("HTTP {status}: {body}"));
        debug!(%status, %message, "Store request rejected");
        Err(StoreError(message))
    }
}

/// Builds the PostgREST `or` filter for a case-insensitive substring search.
pub fn search_condition(term: &str) -> String {
    let pattern = format!("*{term}*");
    let value = if term.contains([',', '.', ':', '(', ')', '"', '\\']) {
        format!("\"{}\"", pattern.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        pattern
    };
    let conditions: Vec<String> = SEARCH_FIELDS
        .iter()
        .map(|field| format!("{field}.ilike.{value}"))
        .collect();
    format!("({})", conditions.join(","))
}

/// Reads the total from a `Content-Range` header such as `0-9/50` or `*/0`.
pub fn parse_total(content_range: &str) -> Option<u64> {
    content_range.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl RecordStore for SupabaseStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert(&self, records: &[StockRecord]) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST)
            .header("Prefer", "return=minimal")
            .json(records)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn query(
        &self,
        filter: &RecordFilter,
        sort: Option<&SortSpec>,
        window: Window,
    ) -> Result<QueryPage, StoreError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(term) = filter.search.as_deref().filter(|t| !t.is_empty()) {
            params.push(("or".to_string(), search_condition(term)));
        }
        if let Some(sort) = sort {
            params.push(("order".to_string(), format!("{}.{}", sort.column, sort.order)));
        }
        params.push(("offset".to_string(), window.start.to_string()));
        params.push(("limit".to_string(), window.len().to_string()));

        let response = self
            .request(Method::GET)
            .header("Prefer", "count=exact")
            .query(&params)
            .send()
            .await?;
        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_total);
        // An offset past the last match is answered with 416 and `*/<total>`.
        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            debug!(?total, start = window.start, "Window starts past the last match");
            return Ok(QueryPage {
                rows: Vec::new(),
                match_count: total.unwrap_or(0),
            });
        }
        let response = Self::check(response).await?;

        let rows: Vec<StockRecord> = response.json().await?;
        let match_count = total.unwrap_or(rows.len() as u64);
        debug!(rows = rows.len(), match_count, "Fetched page");

        Ok(QueryPage { rows, match_count })
    }

    #[instrument(skip(self))]
    async fn distinct_currencies(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .request(Method::GET)
            .query(&[("select", "currency"), ("currency", "not.is.null")])
            .send()
            .await?;
        let rows: Vec<CurrencyRow> = Self::check(response).await?.json().await?;
        Ok(dedup_first_seen(rows.into_iter().filter_map(|r| r.currency)))
    }
}
