use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use gatekeeper_auth::{AuthContext, LOCAL_PROVIDER};
use gatekeeper_core::AppError;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::cookies::clear_refresh_cookie;
use crate::utils::tokens::{bearer_token, refresh_token};
use crate::validator::ValidatedJson;

use super::model::{LoginRequest, MessageResponse, RefreshRequest, SessionParams, TokenResponse};
use super::service::AuthService;

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Login and receive an access token plus a refresh cookie
///
/// Served by the `authentication` filter; this handler is only reached while
/// that filter is disabled.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Missing or malformed credentials", body = ErrorResponse),
        (status = 401, description = "Authentication failed", body = ErrorResponse),
        (status = 404, description = "Login is unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login_unavailable() -> AppError {
    AppError::not_found(anyhow::anyhow!("Login is not available"))
}

/// Exchange an expired access token and the refresh cookie for a new pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenResponse),
        (status = 401, description = "Re-authentication required", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn refresh_tokens(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Response, AppError> {
    let provider = match dto.provider {
        Some(provider) if !provider.trim().is_empty() => provider,
        _ => state.tokens.peek(&dto.expired_token)?.provider,
    };

    let pair = AuthService::refresh(
        &state.tokens,
        &dto.expired_token,
        refresh_token(&headers, &provider),
    )
    .await?;

    AuthService::token_response(&pair, &state.config.cookie, state.tokens.refresh_ttl())
}

/// Access token currently paired with the refresh cookie
#[utoipa::path(
    get,
    path = "/api/auth/session",
    params(SessionParams),
    responses(
        (status = 200, description = "Current session", body = TokenResponse),
        (status = 401, description = "No current session for this refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SessionParams>,
) -> Result<Json<TokenResponse>, AppError> {
    let provider = params
        .provider
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| LOCAL_PROVIDER.to_string());

    let response =
        AuthService::recover_session(&state.tokens, refresh_token(&headers, &provider)).await?;
    Ok(Json(response))
}

/// Revoke the current session and clear the refresh cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = bearer_token(&headers);
    let provider = AuthService::logout(&state.tokens, token.as_deref()).await;
    let cookie = clear_refresh_cookie(&provider, &state.config.cookie)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
        .into_response())
}

/// Authentication context of the caller
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = AuthContext),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(AuthUser(context): AuthUser) -> Json<AuthContext> {
    Json(context)
}
