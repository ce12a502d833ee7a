//! Key layout for token records.
//!
//! - `<prefix>:refresh:<provider>:<subject>` holds the current refresh token
//! - `<prefix>:access:<sha256(refresh token)>` holds the access token issued with it

use sha2::{Digest, Sha256};

#[derive(Clone, Debug)]
pub struct TokenKeys {
    prefix: String,
}

impl TokenKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn build_key(&self, parts: &[&str]) -> String {
        format!("{}:{}", self.prefix, parts.join(":"))
    }

    /// Key of the refresh-token record for `(subject, provider)`.
    pub fn refresh(&self, subject: &str, provider: &str) -> String {
        self.build_key(&["refresh", provider, subject])
    }

    /// Key of the access-token lookup entry for a refresh token.
    ///
    /// The refresh token is hashed so raw token values never appear in key space.
    pub fn access_lookup(&self, refresh_token: &str) -> String {
        let digest = Sha256::digest(refresh_token.as_bytes());
        self.build_key(&["access", &hex::encode(digest)])
    }
}

impl Default for TokenKeys {
    fn default() -> Self {
        Self::new("gatekeeper")
    }
}
