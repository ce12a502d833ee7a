use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AccessClaims {
    /// Subject identifier (login id).
    pub sub: String,
    pub roles: Vec<String>,
    /// Identity provider that authenticated the subject (`server` for local login).
    pub provider: String,
    pub iss: String,
    pub iat: usize,
    pub exp: usize,
    /// Unique token id, so two tokens minted in the same second differ.
    pub jti: String,
}

/// Strips the conventional `ROLE_` prefix so `ROLE_ADMIN` and `ADMIN` compare equal.
pub fn canonical_role(role: &str) -> &str {
    role.strip_prefix("ROLE_").unwrap_or(role)
}

/// Authenticated identity attached to a request once its access token verifies.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AuthContext {
    pub subject: String,
    pub roles: Vec<String>,
    pub provider: String,
}

impl AuthContext {
    pub fn has_role(&self, role: &str) -> bool {
        let wanted = canonical_role(role);
        self.roles.iter().any(|r| canonical_role(r) == wanted)
    }
}

impl From<AccessClaims> for AuthContext {
    fn from(claims: AccessClaims) -> Self {
        Self {
            subject: claims.sub,
            roles: claims.roles,
            provider: claims.provider,
        }
    }
}
