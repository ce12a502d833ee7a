use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::response::Response;
use gatekeeper_auth::{AuthContext, AuthError, TokenManager};
use gatekeeper_config::CookieConfig;
use gatekeeper_core::AppError;
use gatekeeper_pipeline::{Chain, FilterDescriptor, SecurityFilter};
use tracing::{debug, info};

use crate::modules::auth::service::AuthService;
use crate::utils::cookies::refresh_cookie;
use crate::utils::tokens::{NEW_ACCESS_TOKEN_HEADER, access_token, refresh_token};

use super::JWT_VERIFICATION;

/// Verifies the presented access token and attaches an [`AuthContext`].
///
/// Requests without a token continue anonymously. An expired token is
/// exchanged through the refresh flow; the new access token is returned in
/// `X-New-Access-Token` and the new refresh token in a cookie.
pub struct JwtVerificationFilter {
    descriptor: FilterDescriptor,
    tokens: TokenManager,
    cookie_config: CookieConfig,
    cookie_fallback: bool,
}

impl JwtVerificationFilter {
    pub fn new(tokens: TokenManager, cookie_config: CookieConfig, cookie_fallback: bool) -> Self {
        Self {
            descriptor: FilterDescriptor::new(JWT_VERIFICATION, 200),
            tokens,
            cookie_config,
            cookie_fallback,
        }
    }

    async fn refresh_and_proceed(
        &self,
        expired_token: &str,
        mut request: Request,
        chain: Chain,
    ) -> Result<Response, AppError> {
        let claims = self.tokens.peek(expired_token)?;
        let presented = refresh_token(request.headers(), &claims.provider);

        let pair = AuthService::refresh(&self.tokens, expired_token, presented).await?;
        info!(subject = %pair.subject, "Access token refreshed in flight");

        let new_access = HeaderValue::from_str(&pair.access_token).map_err(AppError::internal)?;
        let cookie = refresh_cookie(
            &pair.provider,
            &pair.refresh_token,
            self.tokens.refresh_ttl().as_secs() as i64,
            &self.cookie_config,
        )?;

        request.extensions_mut().insert(AuthContext {
            subject: pair.subject,
            roles: pair.roles,
            provider: pair.provider,
        });

        let mut response = chain.proceed(request).await;
        response.headers_mut().insert(NEW_ACCESS_TOKEN_HEADER, new_access);
        response.headers_mut().append(header::SET_COOKIE, cookie);

        Ok(response)
    }
}

#[async_trait]
impl SecurityFilter for JwtVerificationFilter {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.descriptor
    }

    async fn apply(&self, mut request: Request, chain: Chain) -> Result<Response, AppError> {
        let Some(token) = access_token(request.headers(), self.cookie_fallback) else {
            debug!(path = %request.uri().path(), "No access token presented");
            return Ok(chain.proceed(request).await);
        };

        match self.tokens.verify(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthContext::from(claims));
                Ok(chain.proceed(request).await)
            }
            Err(AuthError::TokenExpired) => self.refresh_and_proceed(&token, request, chain).await,
            Err(e) => Err(e.into()),
        }
    }
}
