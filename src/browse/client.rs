use super::state::FetchRequest;
use crate::core::{CurrencyList, PageEnvelope};
use anyhow::{Context, Result};
use tracing::debug;

/// Client for the backend's `/data-import` endpoints.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stockdata/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub async fn fetch_page(&self, request: &FetchRequest) -> Result<PageEnvelope> {
        let url = format!("{}/data-import", self.base_url);
        debug!(?request, "Requesting page from {}", url);

        let response = self
            .client
            .get(&url)
            .query(request)
            .send()
            .await
            .context("Failed to send page request")?
            .error_for_status()
            .context("Page request was rejected")?;

        response
            .json()
            .await
            .context("Failed to parse page response")
    }

    pub async fn fetch_currencies(&self) -> Result<Vec<String>> {
        let url = format!("{}/data-import/getAvailableTypesAndCurrencies", self.base_url);
        let list: CurrencyList = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send currency request")?
            .error_for_status()
            .context("Currency request was rejected")?
            .json()
            .await
            .context("Failed to parse currency response")?;
        Ok(list.currencies)
    }
}
