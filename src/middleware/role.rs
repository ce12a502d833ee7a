//! Role checks applied directly on routers.
//!
//! The authorization filter already guards paths by role; these layers guard
//! routes that must stay protected even if that filter is switched off.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use gatekeeper_core::AppError;
use tracing::warn;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Requires the configured admin role (`ADMIN_ROLE`).
///
/// ```rust,ignore
/// let admin_routes = Router::new()
///     .route("/filters", get(list_filters))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));
/// ```
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    let admin_role = &state.config.gateway.admin_role;
    if !auth_user.has_role(admin_role) {
        warn!(subject = %auth_user.subject(), "Admin route refused");
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. Required role: {}",
            admin_role
        )));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
