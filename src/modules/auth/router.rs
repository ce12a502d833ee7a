use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{login_unavailable, logout, me, refresh_tokens, session};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_unavailable))
        .route("/refresh", post(refresh_tokens))
        .route("/session", get(session))
        .route("/logout", post(logout))
        .route("/me", get(me))
}
