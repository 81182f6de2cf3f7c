//! Report store proxy
//!
//! Stateless pass-through of list/get/delete/download requests to the
//! external report store. Status code and the content headers travel
//! verbatim; bodies are streamed, not buffered, so large downloads never
//! sit in gateway memory. The gateway makes one connection attempt and
//! never fabricates a success when the store is unreachable.

use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::AppState;

/// Export formats the download surface supports
const DOWNLOAD_FORMATS: [&str; 3] = ["markdown", "pdf", "docx"];

/// Response headers forwarded from the store
const FORWARDED_HEADERS: [&str; 2] = ["content-type", "content-disposition"];

/// GET /api/reports?limit=<n>&offset=<n>
pub async fn list_reports(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ProxyError> {
    let path = match query {
        Some(query) => format!("/api/reports?{}", query),
        None => "/api/reports".to_string(),
    };
    forward(&state, reqwest::Method::GET, &path).await
}

/// GET /api/reports/:id
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ProxyError> {
    validate_report_id(&id)?;
    forward(&state, reqwest::Method::GET, &format!("/api/reports/{}", id)).await
}

/// DELETE /api/reports/:id
///
/// Deletion is forwarded as-is; confirmation is a client concern.
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ProxyError> {
    validate_report_id(&id)?;
    forward(
        &state,
        reqwest::Method::DELETE,
        &format!("/api/reports/{}", id),
    )
    .await
}

/// GET /api/download/:id/:format
///
/// The format set is closed by the interface contract, so unknown formats
/// are rejected before any store connection is made.
pub async fn download_report(
    State(state): State<AppState>,
    Path((id, format)): Path<(String, String)>,
) -> Result<Response, ProxyError> {
    validate_report_id(&id)?;
    if !DOWNLOAD_FORMATS.contains(&format.as_str()) {
        return Err(ProxyError::UnknownFormat(format));
    }
    forward(
        &state,
        reqwest::Method::GET,
        &format!("/api/download/{}/{}", id, format),
    )
    .await
}

/// Forward one request to the report store, streaming the response back
async fn forward(
    state: &AppState,
    method: reqwest::Method,
    path_and_query: &str,
) -> Result<Response, ProxyError> {
    let url = format!(
        "{}{}",
        state.config.reports.store_url.trim_end_matches('/'),
        path_and_query
    );
    debug!(%url, "forwarding to report store");

    let upstream = state
        .http
        .request(method, &url)
        .send()
        .await
        .map_err(|e| ProxyError::StoreUnreachable(e.to_string()))?;

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .map_err(|e| ProxyError::Internal(e.to_string()))?;

    let mut response = Response::builder().status(status);
    for name in FORWARDED_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                response = response.header(name, value);
            }
        }
    }

    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ProxyError::Internal(e.to_string()))
}

/// Reject ids that could escape the store's path space
fn validate_report_id(id: &str) -> Result<(), ProxyError> {
    let valid = !id.is_empty()
        && id.len() < 100
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ProxyError::InvalidId(id.to_string()))
    }
}

/// Report proxy errors
#[derive(Debug)]
pub enum ProxyError {
    InvalidId(String),
    UnknownFormat(String),
    StoreUnreachable(String),
    Internal(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ProxyError::InvalidId(id) => {
                (StatusCode::BAD_REQUEST, format!("Invalid report id: {}", id))
            }
            ProxyError::UnknownFormat(format) => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported format: {}", format),
            ),
            ProxyError::StoreUnreachable(reason) => (
                StatusCode::BAD_GATEWAY,
                format!("Report store unreachable: {}", reason),
            ),
            ProxyError::Internal(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Proxy error: {}", reason),
            ),
        };
        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
