use axum::{Router, routing::{delete, get, post}};
use crate::{AppState, controllers::{home_controller, stocks_controller}};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/stocks",
            get(stocks_controller::get_latest_price).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/stocks/data",
            get(stocks_controller::get_stock_data).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/stocks/metadata",
            get(stocks_controller::get_metadata)
                .delete(stocks_controller::delete_metadata)
                .fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/stocks/metadata/store",
            post(stocks_controller::store_metadata).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/stocks/metadata/delete",
            delete(stocks_controller::delete_metadata).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/stocks/metadata/all",
            get(stocks_controller::get_all_metadata).fallback(home_controller::method_not_allowed),
        )
        .route(
            "/api/stocks/symbols",
            get(stocks_controller::get_batch_symbols).fallback(home_controller::method_not_allowed),
        )
}
