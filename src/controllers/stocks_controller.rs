use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{bad_request, error_response, now_rfc3339, parse_date, required, status_envelope};
use crate::{
    models::{StockMetadata, COMMON_STOCK},
    services::stocks_service,
    AppState,
};

/// Lookback used by `/api/stocks/data` when no start date is given.
const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub symbol: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Deserialize)]
pub struct StoreMetadataRequest {
    pub symbol: Option<String>,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub currency: String,
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub description: String,
    pub website: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Deserialize)]
pub struct BatchQuery {
    pub batch_id: Option<String>,
}

// GET /api/stocks?symbol=
pub async fn get_latest_price(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> Response {
    let Some(symbol) = required(q.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    match stocks_service::latest_price(state.store.as_ref(), &symbol).await {
        Ok(price) => (
            StatusCode::OK,
            Json(json!({
                "symbol": symbol,
                "latest_price": price,
                "timestamp": now_rfc3339(),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(symbol = %symbol, error = %e, "latest price lookup failed");
            error_response(&e)
        }
    }
}

// GET /api/stocks/data?symbol=&start=&end=
pub async fn get_stock_data(State(state): State<AppState>, Query(q): Query<RangeQuery>) -> Response {
    let Some(symbol) = required(q.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    let end = match required(q.end.as_deref()) {
        // a plain end date covers that whole day
        Some(raw) => match parse_date(&raw) {
            Ok(d) if raw.len() == 10 => d + Duration::days(1) - Duration::seconds(1),
            Ok(d) => d,
            Err(e) => return error_response(&e),
        },
        None => Utc::now(),
    };
    let start = match required(q.start.as_deref()) {
        Some(raw) => match parse_date(&raw) {
            Ok(d) => d,
            Err(e) => return error_response(&e),
        },
        None => end - Duration::days(DEFAULT_RANGE_DAYS),
    };

    match stocks_service::bars_in_range(state.store.as_ref(), &symbol, start, end).await {
        Ok(bars) => {
            let count = bars.len();
            (
                StatusCode::OK,
                Json(json!({
                    "symbol": symbol,
                    "start_date": start.format("%Y-%m-%d").to_string(),
                    "end_date": end.format("%Y-%m-%d").to_string(),
                    "data": bars,
                    "count": count,
                    "timestamp": now_rfc3339(),
                })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(symbol = %symbol, error = %e, "stock data lookup failed");
            error_response(&e)
        }
    }
}

// GET /api/stocks/metadata?symbol=
pub async fn get_metadata(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> Response {
    let Some(symbol) = required(q.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    match stocks_service::metadata(state.store.as_ref(), &symbol).await {
        Ok(m) => (StatusCode::OK, Json(m)).into_response(),
        Err(e) => error_response(&e),
    }
}

// GET /api/stocks/metadata/all
pub async fn get_all_metadata(State(state): State<AppState>) -> Response {
    match stocks_service::all_metadata(state.store.as_ref()).await {
        Ok(rows) => {
            let count = rows.len();
            (StatusCode::OK, Json(json!({ "data": rows, "count": count }))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

// POST /api/stocks/metadata/store
pub async fn store_metadata(
    State(state): State<AppState>,
    payload: Result<Json<StoreMetadataRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => return bad_request(format!("invalid request body: {}", e.body_text())),
    };
    let Some(symbol) = required(req.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    let row = StockMetadata {
        symbol,
        company_name: req.company_name,
        industry: req.industry,
        exchange: req.exchange,
        currency: req.currency,
        market_cap: req.market_cap,
        description: req.description,
        website: req.website,
        kind: req.kind.unwrap_or_else(|| COMMON_STOCK.to_string()),
        updated_at: 0,
    };

    match stocks_service::store_metadata(state.store.as_ref(), row).await {
        Ok(stored) => status_envelope(
            StatusCode::OK,
            "success",
            format!("stored metadata for {}", stored.symbol),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "storing metadata failed");
            error_response(&e)
        }
    }
}

// DELETE /api/stocks/metadata?symbol=
// DELETE /api/stocks/metadata/delete?symbol=
pub async fn delete_metadata(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> Response {
    let Some(symbol) = required(q.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    match stocks_service::delete_metadata(state.store.as_ref(), &symbol).await {
        Ok(()) => status_envelope(StatusCode::OK, "success", format!("deleted metadata for {symbol}")),
        Err(e) => error_response(&e),
    }
}

// GET /api/stocks/symbols?batch_id=
pub async fn get_batch_symbols(State(state): State<AppState>, Query(q): Query<BatchQuery>) -> Response {
    let Some(raw) = required(q.batch_id.as_deref()) else {
        return bad_request("batch_id is required");
    };
    let Ok(batch_id) = raw.parse::<i64>() else {
        return bad_request(format!("invalid batch_id '{raw}'"));
    };

    match stocks_service::symbols_in_batch(state.store.as_ref(), batch_id).await {
        Ok(symbols) => {
            let count = symbols.len();
            (
                StatusCode::OK,
                Json(json!({ "batch_id": batch_id, "symbols": symbols, "count": count })),
            )
                .into_response()
        }
        Err(e) => error_response(&e),
    }
}
