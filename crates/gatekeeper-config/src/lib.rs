//! # Gatekeeper Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: token signing and lifetimes
//! - [`cookie`]: refresh-token cookie attributes
//! - [`cors`]: CORS origins
//! - [`server`]: listener addresses
//! - [`gateway`]: pipeline behaviour (login path, public paths, admin role)
//!
//! # Example
//!
//! ```ignore
//! use gatekeeper_config::{JwtConfig, CookieConfig, GatewayConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cookie_config = CookieConfig::from_env();
//! let gateway_config = GatewayConfig::from_env();
//! ```

pub mod cookie;
pub mod cors;
pub mod gateway;
pub mod jwt;
pub mod server;

pub use cookie::{CookieConfig, SameSite};
pub use cors::CorsConfig;
pub use gateway::GatewayConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;

/// Splits a comma-separated value, trimming entries and dropping empty ones.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
