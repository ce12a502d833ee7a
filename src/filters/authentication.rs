use std::sync::Arc;

use async_trait::async_trait;
use axum::Json;
use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::Method;
use axum::response::Response;
use gatekeeper_auth::{IdentityStore, TokenManager};
use gatekeeper_config::CookieConfig;
use gatekeeper_core::AppError;
use gatekeeper_pipeline::{Chain, FilterDescriptor, SecurityFilter};
use tracing::instrument;

use crate::modules::auth::model::LoginRequest;
use crate::modules::auth::service::AuthService;

use super::{AUTHENTICATION, JWT_VERIFICATION};

const MAX_LOGIN_BODY: usize = 16 * 1024;

/// Answers `POST <login_path>` itself; every other request passes through.
pub struct AuthenticationFilter {
    descriptor: FilterDescriptor,
    login_path: String,
    identity_store: Arc<dyn IdentityStore>,
    tokens: TokenManager,
    cookie_config: CookieConfig,
}

impl AuthenticationFilter {
    pub fn new(
        login_path: impl Into<String>,
        identity_store: Arc<dyn IdentityStore>,
        tokens: TokenManager,
        cookie_config: CookieConfig,
    ) -> Self {
        Self {
            descriptor: FilterDescriptor::new(AUTHENTICATION, 100).runs_before(JWT_VERIFICATION),
            login_path: login_path.into(),
            identity_store,
            tokens,
            cookie_config,
        }
    }

    fn is_login(&self, request: &Request) -> bool {
        request.method() == Method::POST && request.uri().path() == self.login_path
    }

    #[instrument(skip_all, name = "login")]
    async fn login(&self, request: Request) -> Result<Response, AppError> {
        let body = to_bytes(request.into_body(), MAX_LOGIN_BODY)
            .await
            .map_err(|_| AppError::bad_request(anyhow::anyhow!("Invalid request body")))?;

        let Json(dto) = Json::<LoginRequest>::from_bytes(&body)
            .map_err(|_| AppError::bad_request(anyhow::anyhow!("Invalid login payload")))?;

        let pair = AuthService::login(self.identity_store.as_ref(), &self.tokens, dto).await?;

        AuthService::token_response(&pair, &self.cookie_config, self.tokens.refresh_ttl())
    }
}

#[async_trait]
impl SecurityFilter for AuthenticationFilter {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.descriptor
    }

    async fn apply(&self, request: Request, chain: Chain) -> Result<Response, AppError> {
        if self.is_login(&request) {
            return self.login(request).await;
        }
        Ok(chain.proceed(request).await)
    }
}
