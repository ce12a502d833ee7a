use anyhow::{Error, anyhow};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Stable machine-readable error codes rendered in every error body.
pub mod codes {
    pub const MALFORMED_REQUEST: &str = "MALFORMED_REQUEST";
    pub const AUTHENTICATION_FAILED: &str = "AUTHENTICATION_FAILED";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const REFRESH_INVALID: &str = "REFRESH_INVALID";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
    pub const FILTER_ORDER_CONFLICT: &str = "FILTER_ORDER_CONFLICT";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Message used for every authentication failure, whatever the root cause.
pub const AUTHENTICATION_FAILED_MESSAGE: &str = "Authentication failed";

/// Message used when a refresh token is missing, revoked or lost a rotation race.
pub const REFRESH_INVALID_MESSAGE: &str = "Re-authentication required";

/// Error returned across the HTTP boundary.
///
/// Renders as `{"error": "<message>", "code": "<CODE>"}` with `status`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, code: &'static str, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            code,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::VALIDATION_FAILED,
            err,
        )
    }

    /// Missing or garbled request payload.
    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, codes::MALFORMED_REQUEST, err)
    }

    /// Uniform authentication failure. The cause is never echoed to the client.
    pub fn authentication_failed() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::AUTHENTICATION_FAILED,
            anyhow!(AUTHENTICATION_FAILED_MESSAGE),
        )
    }

    pub fn token_expired() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::TOKEN_EXPIRED,
            anyhow!("Access token expired"),
        )
    }

    pub fn refresh_invalid() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::REFRESH_INVALID,
            anyhow!(REFRESH_INVALID_MESSAGE),
        )
    }

    pub fn forbidden<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::FORBIDDEN, codes::FORBIDDEN, err)
    }

    pub fn configuration<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::CONFIGURATION_ERROR,
            err,
        )
    }

    /// A filter registration refused because it would create an ordering cycle.
    pub fn order_conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, codes::FILTER_ORDER_CONFLICT, err)
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status.as_u16(), self.error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Internal details stay in the logs.
        let message = if self.code == codes::INTERNAL_ERROR {
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        };

        let body = Json(json!({
            "error": message,
            "code": self.code,
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err)
    }
}
