//! Shared helpers for the HTTP layer.
//!
//! - [`cookies`]: refresh-token cookie names, `Set-Cookie` values and parsing
//! - [`tokens`]: access and refresh token extraction from requests

pub mod cookies;
pub mod tokens;
