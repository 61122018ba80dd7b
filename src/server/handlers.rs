use super::AppState;
use crate::core::{ImportError, QueryError, RawReadParams, ReadParams};
use axum::{
    Json,
    extract::{Multipart, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{error, warn};

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// `POST /data-import` with multipart fields `file` and `dataType`.
pub async fn import_data(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file = None;
    let mut data_type = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Malformed multipart body");
                return reply(
                    StatusCode::BAD_REQUEST,
                    json!({ "message": "Invalid multipart body.", "error": e.body_text() }),
                );
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        let read = match name.as_str() {
            "file" => field.bytes().await.map(|bytes| file = Some(bytes)),
            "dataType" => field.text().await.map(|text| data_type = Some(text)),
            _ => Ok(()),
        };
        if let Err(e) = read {
            warn!(error = %e, field = %name, "Failed to read multipart field");
            return reply(
                StatusCode::BAD_REQUEST,
                json!({ "message": "Invalid multipart body.", "error": e.body_text() }),
            );
        }
    }

    let Some(file) = file else {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "message": "No file uploaded!" }),
        );
    };
    let Some(data_type) = data_type.filter(|t| !t.is_empty()) else {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "message": "DataType is required!" }),
        );
    };

    match state.importer.process_data(&file, &data_type).await {
        Ok(summary) => reply(
            StatusCode::CREATED,
            json!({ "message": "Data successfully imported!", "result": summary }),
        ),
        Err(e) => {
            let status = match e {
                ImportError::InvalidFormat => StatusCode::UNPROCESSABLE_ENTITY,
                ImportError::Store(_) => {
                    error!(error = %e, "Import failed in store");
                    StatusCode::BAD_GATEWAY
                }
            };
            reply(
                status,
                json!({ "message": "Error while importing data.", "error": e.to_string() }),
            )
        }
    }
}

/// `GET /data-import?page&pageSize&searchQuery&sortBy&sortOrder`.
pub async fn read_data(
    State(state): State<AppState>,
    query: Result<Query<RawReadParams>, QueryRejection>,
) -> Response {
    let raw = match query {
        Ok(Query(raw)) => raw,
        Err(e) => {
            warn!(error = %e, "Rejected read parameters");
            return reply(
                StatusCode::BAD_REQUEST,
                json!({ "error": "Failed to fetch data", "errors": e.body_text() }),
            );
        }
    };
    let params = ReadParams::from_raw(&raw);
    match state.query.read_data(&params).await {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => {
            let status = match e {
                QueryError::UnknownSortField(_) => StatusCode::BAD_REQUEST,
                QueryError::Store(_) => {
                    error!(error = %e, "Failed to read data");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            reply(
                status,
                json!({ "error": "Failed to fetch data", "errors": e.to_string() }),
            )
        }
    }
}

/// `GET /data-import/getAvailableTypesAndCurrencies`.
pub async fn available_currencies(State(state): State<AppState>) -> Response {
    match state.query.available_currencies().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "message": e.to_string() }),
        ),
    }
}
