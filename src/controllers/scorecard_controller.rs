use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{bad_request, error_response, required};
use crate::AppState;

#[derive(Deserialize)]
pub struct ScorecardRequest {
    pub symbol: Option<String>,
}

// POST /api/scorecard
pub async fn compute_scorecard(
    State(state): State<AppState>,
    payload: Result<Json<ScorecardRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = payload else {
        return bad_request("invalid request body");
    };
    let Some(symbol) = required(req.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    match state.scorecards.compute_scorecard(&symbol).await {
        Ok(card) => (StatusCode::OK, Json(card)).into_response(),
        Err(e) => {
            tracing::error!(symbol = %symbol, error = %e, "scorecard computation failed");
            error_response(&e)
        }
    }
}

// GET /api/scorecard?symbol=
pub async fn get_scorecard(State(state): State<AppState>, Query(q): Query<ScorecardRequest>) -> Response {
    let Some(symbol) = required(q.symbol.as_deref()) else {
        return bad_request("symbol is required");
    };

    match state.scorecards.get_scorecard(&symbol).await {
        Ok(card) => (StatusCode::OK, Json(card)).into_response(),
        Err(e) => error_response(&e),
    }
}
