use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::{now_rfc3339, status_envelope};

// GET /health
pub async fn health() -> Response {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "timestamp": now_rfc3339() })),
    )
        .into_response()
}

pub async fn not_found(uri: Uri) -> Response {
    status_envelope(StatusCode::NOT_FOUND, "error", format!("no route for {}", uri.path()))
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    status_envelope(
        StatusCode::METHOD_NOT_ALLOWED,
        "error",
        format!("method {} not allowed on {}", method, uri.path()),
    )
}
