use crate::middleware::role::require_admin;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use super::controller::{
    add_condition, list_filters, remove_condition, set_filter_status, toggle_condition,
};

pub fn init_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/filters", get(list_filters))
        .route("/filters/{filter_id}/conditions", post(add_condition))
        .route(
            "/filters/{filter_id}/conditions/{condition_id}",
            patch(toggle_condition).delete(remove_condition),
        )
        .route("/filters/{filter_id}/status", post(set_filter_status))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
