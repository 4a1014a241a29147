use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{bad_request, error_response, now_rfc3339, parse_date, required};
use crate::{
    error::AppError,
    services::{context::CallContext, extraction_service::ExtractionSummary},
    AppState,
};

#[derive(Deserialize)]
pub struct ExtractStockRequest {
    pub symbol: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Deserialize)]
pub struct BatchExtractRequest {
    #[serde(default)]
    pub symbols: Vec<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Deserialize)]
pub struct ExchangeRequest {
    pub exchange: Option<String>,
}

#[derive(Deserialize)]
pub struct SymbolsRequest {
    #[serde(default)]
    pub symbols: Vec<String>,
}

#[derive(Deserialize)]
pub struct SymbolRequest {
    pub symbol: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub symbol: Option<String>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| bad_request(format!("invalid request body: {}", e.body_text())))
}

/// Missing `to` is now, missing `from` is one day before `to`.
fn date_range(from: Option<&str>, to: Option<&str>) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let to = match required(to) {
        Some(raw) => parse_date(&raw)?,
        None => Utc::now(),
    };
    let from = match required(from) {
        Some(raw) => parse_date(&raw)?,
        None => to - Duration::days(1),
    };
    Ok((from, to))
}

fn clean_symbols(symbols: Vec<String>) -> Vec<String> {
    symbols
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn symbol_result(symbol: &str, outcome: Result<ExtractionSummary, AppError>, what: &str) -> Response {
    match outcome {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "symbol": symbol,
                "status": "success",
                "message": format!("stored {} {what} for {symbol}", summary.stored),
                "timestamp": now_rfc3339(),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(symbol, error = %e, "extraction failed");
            (
                e.status_code(),
                Json(json!({
                    "symbol": symbol,
                    "status": "error",
                    "message": e.to_string(),
                    "timestamp": now_rfc3339(),
                })),
            )
                .into_response()
        }
    }
}

fn summary_result(outcome: Result<ExtractionSummary, AppError>, message: &str) -> Response {
    match outcome {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": message,
                "timestamp": now_rfc3339(),
                "state": summary.state,
                "processed": summary.processed,
                "stored": summary.stored,
                "failed": summary.failed,
                "skipped": summary.skipped,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "extraction failed");
            error_response(&e)
        }
    }
}

// POST /api/extract/stock
pub async fn extract_stock(
    State(state): State<AppState>,
    payload: Result<Json<ExtractStockRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let Some(symbol) = required(req.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };
    let (from, to) = match date_range(req.from.as_deref(), req.to.as_deref()) {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };

    let ctx = CallContext::with_timeout(state.settings.timeouts.single);
    let outcome = state.extraction.extract_and_store_bars(&ctx, &symbol, from, to).await;
    symbol_result(&symbol, outcome, "bars")
}

// POST /api/extract/batch
pub async fn extract_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchExtractRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let symbols = clean_symbols(req.symbols);
    if symbols.is_empty() {
        return bad_request("symbols must not be empty");
    }
    let (from, to) = match date_range(req.from.as_deref(), req.to.as_deref()) {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };

    let ctx = CallContext::with_timeout(state.settings.timeouts.batch);
    let summary = state.extraction.batch_extract(&ctx, &symbols, from, to).await;

    (
        StatusCode::OK,
        Json(json!({
            "status": "completed",
            "message": format!("batch extraction finished for {} symbols", symbols.len()),
            "timestamp": now_rfc3339(),
            "processed": summary.processed,
            "failed": summary.failed,
        })),
    )
        .into_response()
}

// POST /api/extract/symbols
pub async fn extract_symbols(
    State(state): State<AppState>,
    payload: Result<Json<ExchangeRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let Some(exchange) = required(req.exchange.as_deref()) else {
        return bad_request("exchange is required");
    };

    let ctx = CallContext::with_timeout(state.settings.timeouts.exchange);
    let outcome = state.extraction.extract_and_store_symbols(&ctx, &exchange).await;
    summary_result(outcome, &format!("symbols extracted for {exchange}"))
}

// POST /api/extract/stockmetadata
pub async fn extract_stock_metadata(
    State(state): State<AppState>,
    payload: Result<Json<ExchangeRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let Some(exchange) = required(req.exchange.as_deref()) else {
        return bad_request("exchange is required");
    };

    let ctx = CallContext::with_timeout(state.settings.timeouts.exchange);
    let outcome = state.extraction.extract_and_store_metadata(&ctx, &exchange).await;
    summary_result(outcome, &format!("metadata extracted for {exchange}"))
}

// POST /api/extract/companyprofile
pub async fn extract_company_profile(
    State(state): State<AppState>,
    payload: Result<Json<SymbolsRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let symbols = clean_symbols(req.symbols);
    if symbols.is_empty() {
        return bad_request("symbols must not be empty");
    }

    let ctx = CallContext::with_timeout(state.settings.timeouts.batch);
    let outcome = state.extraction.extract_and_store_company_data(&ctx, &symbols).await;
    summary_result(outcome, "company profiles extracted")
}

// POST /api/extract/quote
pub async fn extract_quote(
    State(state): State<AppState>,
    payload: Result<Json<SymbolRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let Some(symbol) = required(req.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    let ctx = CallContext::with_timeout(state.settings.timeouts.single);
    let outcome = state.extraction.extract_latest_quote(&ctx, &symbol).await;
    symbol_result(&symbol, outcome, "quote bars")
}

// POST /api/extract/timeseries
pub async fn extract_time_series(
    State(state): State<AppState>,
    payload: Result<Json<SymbolRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let Some(symbol) = required(req.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    let ctx = CallContext::with_timeout(state.settings.timeouts.single);
    let outcome = state.extraction.extract_and_store_time_series(&ctx, &symbol).await;
    symbol_result(&symbol, outcome, "time series bars")
}

#[derive(Clone, Copy)]
enum Fundamentals {
    Overview,
    IncomeStatement,
    BalanceSheet,
}

async fn extract_fundamentals(
    state: AppState,
    payload: Result<Json<SymbolsRequest>, JsonRejection>,
    kind: Fundamentals,
) -> Response {
    let req = match body(payload) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let symbols = clean_symbols(req.symbols);
    if symbols.is_empty() {
        return bad_request("symbols must not be empty");
    }

    let ctx = CallContext::with_timeout(state.settings.timeouts.batch);
    let (summary, what) = match kind {
        Fundamentals::Overview => (state.extraction.batch_extract_overview(&ctx, &symbols).await, "overviews"),
        Fundamentals::IncomeStatement => (
            state.extraction.batch_extract_income_statement(&ctx, &symbols).await,
            "income statements",
        ),
        Fundamentals::BalanceSheet => (
            state.extraction.batch_extract_balance_sheet(&ctx, &symbols).await,
            "balance sheets",
        ),
    };

    summary_result(Ok(summary), &format!("{what} extracted for {} symbols", symbols.len()))
}

// POST /api/extract/overview
pub async fn extract_overview(
    State(state): State<AppState>,
    payload: Result<Json<SymbolsRequest>, JsonRejection>,
) -> Response {
    extract_fundamentals(state, payload, Fundamentals::Overview).await
}

// POST /api/extract/incomestatement
pub async fn extract_income_statement(
    State(state): State<AppState>,
    payload: Result<Json<SymbolsRequest>, JsonRejection>,
) -> Response {
    extract_fundamentals(state, payload, Fundamentals::IncomeStatement).await
}

// POST /api/extract/balancesheet
pub async fn extract_balance_sheet(
    State(state): State<AppState>,
    payload: Result<Json<SymbolsRequest>, JsonRejection>,
) -> Response {
    extract_fundamentals(state, payload, Fundamentals::BalanceSheet).await
}

// GET /api/extract/status?symbol=
pub async fn extraction_status(Query(q): Query<StatusQuery>) -> Response {
    let Some(symbol) = required(q.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    (
        StatusCode::OK,
        Json(json!({
            "symbol": symbol,
            "status": "unknown",
            "timestamp": now_rfc3339(),
        })),
    )
        .into_response()
}
