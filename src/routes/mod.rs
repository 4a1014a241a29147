use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{AppState, controllers::home_controller};

pub mod extraction_routes;
pub mod home_routes;
pub mod scorecard_routes;
pub mod stocks_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = stocks_routes::add_routes(router);
    let router = extraction_routes::add_routes(router);
    let router = scorecard_routes::add_routes(router);

    router
        .fallback(home_controller::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
