//! HTTP surface of the import and query services

pub mod handlers;

use crate::core::config::ServerConfig;
use crate::core::{Importer, QueryService, RecordStore};
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub importer: Arc<Importer>,
    pub query: Arc<QueryService>,
}

impl AppState {
    /// Both services share the one store instance.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            importer: Arc::new(Importer::new(Arc::clone(&store))),
            query: Arc::new(QueryService::new(store)),
        }
    }
}

pub fn router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new().allow_origin(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {origin}"))?,
        ),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/data-import",
            get(handlers::read_data).post(handlers::import_data),
        )
        .route(
            "/data-import/getAvailableTypesAndCurrencies",
            get(handlers::available_currencies),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub async fn serve(store: Arc<dyn RecordStore>, config: &ServerConfig) -> Result<()> {
    let app = router(AppState::new(store), config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("API server listening on http://{}", config.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
