use axum::{Router, routing::get};
use crate::{AppState, controllers::{home_controller, scorecard_controller}};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route(
        "/api/scorecard",
        get(scorecard_controller::get_scorecard)
            .post(scorecard_controller::compute_scorecard)
            .fallback(home_controller::method_not_allowed),
    )
}
