use axum::http::{HeaderMap, header};

use crate::utils::cookies::{ACCESS_COOKIE, read_cookie, refresh_cookie_name};

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
pub const NEW_ACCESS_TOKEN_HEADER: &str = "x-new-access-token";

/// Bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Access token from the header, falling back to the access cookie when allowed.
pub fn access_token(headers: &HeaderMap, cookie_fallback: bool) -> Option<String> {
    bearer_token(headers).or_else(|| {
        if cookie_fallback {
            read_cookie(headers, ACCESS_COOKIE)
        } else {
            None
        }
    })
}

/// Refresh token for `provider`: its cookie first, then the request header.
pub fn refresh_token(headers: &HeaderMap, provider: &str) -> Option<String> {
    read_cookie(headers, &refresh_cookie_name(provider)).or_else(|| {
        headers
            .get(REFRESH_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}
