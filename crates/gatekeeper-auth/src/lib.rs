//! # Gatekeeper Auth
//!
//! Token lifecycle for the Gatekeeper gateway.
//!
//! - [`claims`]: access-token claims and the request-scoped [`AuthContext`]
//! - [`jwt`]: signing and verification of access tokens
//! - [`refresh`]: opaque refresh-token generation
//! - [`manager`]: [`TokenManager`], which issues, verifies, rotates and revokes token pairs
//! - [`identity`]: the [`IdentityStore`] contract consulted at login
//! - [`error`]: [`AuthError`], the authentication failure taxonomy
//!
//! # Token Types
//!
//! - **Access token**: short-lived signed JWT carrying subject, roles and provider
//! - **Refresh token**: long-lived random value whose validity is decided by
//!   the record held in the [`TokenStore`](gatekeeper_cache::TokenStore)
//!
//! # Example
//!
//! ```ignore
//! use gatekeeper_auth::TokenManager;
//!
//! let pair = manager.issue("alice", vec!["USER".into()], "server").await?;
//! let claims = manager.verify(&pair.access_token)?;
//! let rotated = manager.rotate(&pair.access_token, &pair.refresh_token).await?;
//! ```

pub mod claims;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod manager;
pub mod refresh;

pub use claims::{AccessClaims, AuthContext, canonical_role};
pub use error::AuthError;
pub use identity::{
    CredentialsRecord, IdentityStore, InMemoryIdentityStore, authenticate, validate_login_id,
};
pub use jwt::{create_access_token, decode_ignoring_expiry, verify_token};
pub use manager::{TokenManager, TokenPair};
pub use refresh::generate_refresh_token;

/// Provider name of tokens issued by this gateway's own login.
pub const LOCAL_PROVIDER: &str = "server";
