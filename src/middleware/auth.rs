use axum::{extract::FromRequestParts, http::request::Parts};
use gatekeeper_auth::AuthContext;
use gatekeeper_core::AppError;

/// Identity attached by the JWT verification filter.
///
/// Rejects with `AUTHENTICATION_FAILED` when the request reached the handler
/// anonymously.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

impl AuthUser {
    pub fn subject(&self) -> &str {
        &self.0.subject
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.0.has_role(role)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(AppError::authentication_failed)
    }
}
