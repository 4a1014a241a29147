pub mod extraction_controller;
pub mod home_controller;
pub mod scorecard_controller;
pub mod stocks_controller;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;

use crate::error::AppError;

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// `{status:"error", message, timestamp}` with the error's HTTP status.
pub(crate) fn error_response(err: &AppError) -> Response {
    (
        err.status_code(),
        Json(json!({
            "status": "error",
            "message": err.to_string(),
            "timestamp": now_rfc3339(),
        })),
    )
        .into_response()
}

pub(crate) fn bad_request(message: impl Into<String>) -> Response {
    error_response(&AppError::InvalidInput(message.into()))
}

pub(crate) fn status_envelope(status: StatusCode, state: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "status": state,
            "message": message.into(),
            "timestamp": now_rfc3339(),
        })),
    )
        .into_response()
}

/// Accepts an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub(crate) fn parse_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| AppError::InvalidInput(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

/// Trimmed, non-empty value or `None`.
pub(crate) fn required(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
