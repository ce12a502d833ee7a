use std::env;

use crate::{parse_bool, split_list};

pub const DEFAULT_PUBLIC_PATHS: &str =
    "/api/auth/login,/api/auth/refresh,/api/auth/session,/api/auth/logout,/api/health,/api-docs/**";

/// Behaviour of the security pipeline itself.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Path of the login endpoint handled by the authentication filter (POST only).
    pub login_path: String,
    /// Read the access token from a cookie when no `Authorization` header is sent.
    pub access_token_cookie_fallback: bool,
    /// Take the caller address from the left-most `X-Forwarded-For` entry.
    pub trust_forwarded_for: bool,
    pub admin_role: String,
    /// Ant patterns that bypass token verification.
    pub public_paths: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            login_path: "/api/auth/login".to_string(),
            access_token_cookie_fallback: false,
            trust_forwarded_for: false,
            admin_role: "ADMIN".to_string(),
            public_paths: split_list(DEFAULT_PUBLIC_PATHS),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            login_path: env::var("LOGIN_PATH").unwrap_or(defaults.login_path),
            access_token_cookie_fallback: env::var("ACCESS_TOKEN_COOKIE_FALLBACK")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.access_token_cookie_fallback),
            trust_forwarded_for: env::var("TRUST_FORWARDED_FOR")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.trust_forwarded_for),
            admin_role: env::var("ADMIN_ROLE").unwrap_or(defaults.admin_role),
            public_paths: env::var("PUBLIC_PATHS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.public_paths),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.login_path, "/api/auth/login");
        assert!(!config.access_token_cookie_fallback);
        assert_eq!(config.admin_role, "ADMIN");
        assert_eq!(config.public_paths.len(), 6);
        assert!(config.public_paths.contains(&"/api-docs/**".to_string()));
    }
}
