use std::time::Duration;

use axum::Json;
use chrono::Utc;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use gatekeeper_auth::{AuthError, IdentityStore, LOCAL_PROVIDER, TokenManager, TokenPair, authenticate};
use gatekeeper_config::CookieConfig;
use gatekeeper_core::AppError;
use tracing::{error, info, instrument, warn};

use crate::metrics::{track_login, track_token_refresh};
use crate::utils::cookies::refresh_cookie;

use super::model::{LoginRequest, TokenResponse};

pub struct AuthService;

impl AuthService {
    /// Checks credentials and issues a fresh token pair for the local provider.
    #[instrument(skip_all)]
    pub async fn login(
        identity_store: &dyn IdentityStore,
        tokens: &TokenManager,
        dto: LoginRequest,
    ) -> Result<TokenPair, AppError> {
        let record = match authenticate(identity_store, &dto.login_id, &dto.password).await {
            Ok(record) => record,
            Err(e) => {
                track_login(match e {
                    AuthError::MalformedRequest(_) => "malformed",
                    AuthError::AuthenticationFailed => "failure",
                    _ => "error",
                });
                return Err(e.into());
            }
        };

        let pair = tokens
            .issue(&record.subject_id, record.roles, LOCAL_PROVIDER)
            .await
            .inspect_err(|_| track_login("error"))?;

        track_login("success");
        info!(subject = %pair.subject, "Login succeeded");

        Ok(pair)
    }

    /// Rotates the pair behind `expired_token`.
    ///
    /// A missing refresh token is a `RefreshInvalid` rejection like any other.
    #[instrument(skip_all)]
    pub async fn refresh(
        tokens: &TokenManager,
        expired_token: &str,
        refresh_token: Option<String>,
    ) -> Result<TokenPair, AppError> {
        let Some(refresh_token) = refresh_token else {
            track_token_refresh("rejected");
            warn!("Expired access token presented without a refresh token");
            return Err(AppError::refresh_invalid());
        };

        match tokens.rotate(expired_token, &refresh_token).await {
            Ok(pair) => {
                track_token_refresh("rotated");
                Ok(pair)
            }
            Err(e) => {
                track_token_refresh(match e {
                    AuthError::RefreshInvalid | AuthError::AuthenticationFailed => "rejected",
                    _ => "error",
                });
                Err(e.into())
            }
        }
    }

    /// Revokes the session named by `access_token` and returns its provider.
    ///
    /// Tokens that are absent or not genuine revoke nothing.
    #[instrument(skip_all)]
    pub async fn logout(tokens: &TokenManager, access_token: Option<&str>) -> String {
        let Some(claims) = access_token.and_then(|token| tokens.peek(token).ok()) else {
            return LOCAL_PROVIDER.to_string();
        };

        match tokens.revoke(&claims.sub, &claims.provider).await {
            Ok(()) => info!(subject = %claims.sub, provider = %claims.provider, "Logged out"),
            Err(e) => {
                error!(subject = %claims.sub, error = %e, "Failed to revoke refresh token on logout")
            }
        }

        claims.provider
    }

    /// Access token still paired with `refresh_token`.
    #[instrument(skip_all)]
    pub async fn recover_session(
        tokens: &TokenManager,
        refresh_token: Option<String>,
    ) -> Result<TokenResponse, AppError> {
        let Some(refresh_token) = refresh_token else {
            return Err(AppError::refresh_invalid());
        };

        let Some(access_token) = tokens.recover_access_token(&refresh_token).await? else {
            warn!("No current session for the presented refresh token");
            return Err(AppError::refresh_invalid());
        };

        let claims = tokens.peek(&access_token)?;
        let expires_in = (claims.exp as i64 - Utc::now().timestamp()).max(0);

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            subject: claims.sub,
            roles: claims.roles,
        })
    }

    /// Body, `Authorization` header and refresh cookie for a freshly issued pair.
    pub fn token_response(
        pair: &TokenPair,
        cookie_config: &CookieConfig,
        refresh_ttl: Duration,
    ) -> Result<Response, AppError> {
        let cookie = refresh_cookie(
            &pair.provider,
            &pair.refresh_token,
            refresh_ttl.as_secs() as i64,
            cookie_config,
        )?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", pair.access_token))
            .map_err(AppError::internal)?;

        let mut response = Json(TokenResponse::from(pair)).into_response();
        response.headers_mut().insert(header::AUTHORIZATION, bearer);
        response.headers_mut().append(header::SET_COOKIE, cookie);

        Ok(response)
    }
}
