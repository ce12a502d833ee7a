//! Access-token signing and verification.
//!
//! Access tokens are HS256 JWTs signed with [`JwtConfig::secret`]. Verification
//! distinguishes an expired token, which may still be refreshed, from every
//! other failure, which may not.
//!
//! # Example
//!
//! ```ignore
//! use gatekeeper_auth::{create_access_token, verify_token};
//! use gatekeeper_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token("alice", &["USER".to_string()], "server", &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.sub, "alice");
//! ```

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use gatekeeper_config::JwtConfig;

use crate::claims::AccessClaims;
use crate::error::AuthError;

/// Creates a signed access token for `subject`.
///
/// # Arguments
///
/// * `subject` - Subject identifier placed in `sub`
/// * `roles` - Role names granted to the subject
/// * `provider` - Identity provider that authenticated the subject
/// * `jwt_config` - Secret, issuer and lifetime
///
/// # Errors
///
/// Returns [`AuthError::Signing`] if encoding fails.
pub fn create_access_token(
    subject: &str,
    roles: &[String],
    provider: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry.max(0) as usize;

    let claims = AccessClaims {
        sub: subject.to_string(),
        roles: roles.to_vec(),
        provider: provider.to_string(),
        iss: jwt_config.issuer.clone(),
        iat: now,
        exp,
        jti: Uuid::new_v4().to_string(),
    };

    sign(&claims, jwt_config)
}

pub(crate) fn sign(claims: &AccessClaims, jwt_config: &JwtConfig) -> Result<String, AuthError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

fn validation(jwt_config: &JwtConfig, validate_exp: bool) -> Validation {
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation.validate_exp = validate_exp;
    validation.set_issuer(&[jwt_config.issuer.as_str()]);
    validation
}

/// Verifies signature, issuer and expiry of an access token.
///
/// # Errors
///
/// - [`AuthError::TokenExpired`] if the token is correctly signed but past `exp`
/// - [`AuthError::AuthenticationFailed`] for any other failure
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<AccessClaims, AuthError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(jwt_config, true),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::AuthenticationFailed,
    })
}

/// Verifies signature and issuer but accepts an expired token.
///
/// Used to read the subject of an expired token during refresh and logout.
///
/// # Errors
///
/// Returns [`AuthError::AuthenticationFailed`] if the token is not genuine.
pub fn decode_ignoring_expiry(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<AccessClaims, AuthError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(jwt_config, false),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::AuthenticationFailed)
}
