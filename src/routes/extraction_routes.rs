use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::{extraction_controller, home_controller}};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/extract/stock",
            post(extraction_controller::extract_stock).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/batch",
            post(extraction_controller::extract_batch).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/symbols",
            post(extraction_controller::extract_symbols).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/stockmetadata",
            post(extraction_controller::extract_stock_metadata).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/companyprofile",
            post(extraction_controller::extract_company_profile).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/quote",
            post(extraction_controller::extract_quote).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/timeseries",
            post(extraction_controller::extract_time_series).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/overview",
            post(extraction_controller::extract_overview).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/incomestatement",
            post(extraction_controller::extract_income_statement).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/balancesheet",
            post(extraction_controller::extract_balance_sheet).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/extract/status",
            get(extraction_controller::extraction_status).fallback(home_controller::method_not_allowed),
        )
}
