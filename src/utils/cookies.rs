//! Refresh-token cookie handling.
//!
//! The local provider uses `refreshToken`; every other provider gets its own
//! `<provider>_refreshToken` so sessions from different providers coexist.

use axum::http::{HeaderMap, HeaderValue, header};
use gatekeeper_auth::LOCAL_PROVIDER;
use gatekeeper_config::CookieConfig;
use gatekeeper_core::AppError;

pub const REFRESH_COOKIE: &str = "refreshToken";
pub const ACCESS_COOKIE: &str = "accessToken";

pub fn refresh_cookie_name(provider: &str) -> String {
    if provider.is_empty() || provider == LOCAL_PROVIDER {
        REFRESH_COOKIE.to_string()
    } else {
        format!("{provider}_{REFRESH_COOKIE}")
    }
}

/// Returns the value of cookie `name` from every `Cookie` header on the request.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn build(
    name: &str,
    value: &str,
    max_age: i64,
    config: &CookieConfig,
) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{name}={value}; Max-Age={max_age}; Path=/; Domain={}; HttpOnly; SameSite={}",
        config.domain, config.same_site
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(AppError::internal)
}

/// `Set-Cookie` value delivering `refresh_token` for `provider`.
pub fn refresh_cookie(
    provider: &str,
    refresh_token: &str,
    max_age: i64,
    config: &CookieConfig,
) -> Result<HeaderValue, AppError> {
    build(
        &refresh_cookie_name(provider),
        refresh_token,
        max_age,
        config,
    )
}

/// `Set-Cookie` value that removes the refresh cookie of `provider`.
pub fn clear_refresh_cookie(provider: &str, config: &CookieConfig) -> Result<HeaderValue, AppError> {
    build(&refresh_cookie_name(provider), "", 0, config)
}
