use anyhow::anyhow;
use gatekeeper_cache::CacheError;
use gatekeeper_core::AppError;

/// Failure taxonomy of the token lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Bad credentials, bad signature or a missing token where one is required.
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Access token expired")]
    TokenExpired,

    /// Refresh token missing, revoked, mismatched, or the store could not confirm it.
    #[error("Re-authentication required")]
    RefreshInvalid,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Identity store error: {0}")]
    IdentityStore(String),

    #[error(transparent)]
    Store(#[from] CacheError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MalformedRequest(msg) => AppError::bad_request(anyhow!(msg)),
            AuthError::AuthenticationFailed => AppError::authentication_failed(),
            AuthError::TokenExpired => AppError::token_expired(),
            AuthError::RefreshInvalid => AppError::refresh_invalid(),
            signing @ AuthError::Signing(_) => AppError::configuration(signing),
            other => AppError::internal(other),
        }
    }
}
