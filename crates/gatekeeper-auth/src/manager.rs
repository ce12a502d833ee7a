//! Token pair lifecycle.
//!
//! A pair is an access token plus a refresh token. The refresh record at
//! `refresh:<provider>:<subject>` is the only source of truth for whether a
//! refresh token is valid; rotation replaces it with a store-level
//! compare-and-swap so at most one of several concurrent refreshes wins.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use gatekeeper_cache::{TokenKeys, TokenStore};
use gatekeeper_config::JwtConfig;

use crate::claims::AccessClaims;
use crate::error::AuthError;
use crate::jwt::{create_access_token, decode_ignoring_expiry, verify_token};
use crate::refresh::generate_refresh_token;

/// Tokens handed to a client after login or rotation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(skip)]
    pub refresh_token: String,
    pub subject: String,
    pub roles: Vec<String>,
    pub provider: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    keys: TokenKeys,
    config: JwtConfig,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("keys", &self.keys)
            .field("access_token_expiry", &self.config.access_token_expiry)
            .field("refresh_token_expiry", &self.config.refresh_token_expiry)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>, keys: TokenKeys, config: JwtConfig) -> Self {
        Self {
            store,
            keys,
            config,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.config.refresh_token_expiry.max(0) as u64)
    }

    fn mint(&self, subject: &str, roles: Vec<String>, provider: &str) -> Result<TokenPair, AuthError> {
        let access_token = create_access_token(subject, &roles, provider, &self.config)?;

        Ok(TokenPair {
            access_token,
            refresh_token: generate_refresh_token(),
            subject: subject.to_string(),
            roles,
            provider: provider.to_string(),
            expires_in: self.config.access_token_expiry,
        })
    }

    /// Issues a new pair and records its refresh token, replacing any earlier
    /// record for the same `(subject, provider)`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the refresh record cannot be written.
    #[instrument(skip_all, fields(subject = %subject, provider = %provider))]
    pub async fn issue(
        &self,
        subject: &str,
        roles: Vec<String>,
        provider: &str,
    ) -> Result<TokenPair, AuthError> {
        let pair = self.mint(subject, roles, provider)?;
        let ttl = self.refresh_ttl();

        if let Some(previous) = self.store.get(&self.keys.refresh(subject, provider)).await? {
            self.store.delete(&self.keys.access_lookup(&previous)).await?;
        }

        self.store
            .put(&self.keys.refresh(subject, provider), &pair.refresh_token, ttl)
            .await?;
        self.store
            .put(
                &self.keys.access_lookup(&pair.refresh_token),
                &pair.access_token,
                ttl,
            )
            .await?;

        info!("Token pair issued");

        Ok(pair)
    }

    /// Verifies signature and expiry of an access token.
    pub fn verify(&self, access_token: &str) -> Result<AccessClaims, AuthError> {
        verify_token(access_token, &self.config)
    }

    /// Reads the claims of a genuine token whether or not it has expired.
    pub fn peek(&self, access_token: &str) -> Result<AccessClaims, AuthError> {
        decode_ignoring_expiry(access_token, &self.config)
    }

    /// Checks that `refresh_token` is the current record for `(subject, provider)`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RefreshInvalid`] on mismatch, absence, or store failure.
    #[instrument(skip_all, fields(subject = %subject, provider = %provider))]
    pub async fn validate_refresh(
        &self,
        subject: &str,
        provider: &str,
        refresh_token: &str,
    ) -> Result<(), AuthError> {
        match self.store.get(&self.keys.refresh(subject, provider)).await {
            Ok(Some(current)) if current == refresh_token => Ok(()),
            Ok(_) => Err(AuthError::RefreshInvalid),
            Err(e) => {
                error!(error = %e, "Token store unavailable while validating refresh token");
                Err(AuthError::RefreshInvalid)
            }
        }
    }

    /// Exchanges an expired access token and its refresh token for a new pair.
    ///
    /// The subject and provider come from `access_token`, which must be
    /// genuinely signed but may be expired. The stored refresh record is
    /// swapped from `refresh_token` to the new value in one atomic step, so the
    /// old refresh token stops validating the moment the new one is stored.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthenticationFailed`] if `access_token` is not genuine
    /// - [`AuthError::RefreshInvalid`] if the record is absent, holds a
    ///   different value, was swapped concurrently, or the store failed
    #[instrument(skip_all)]
    pub async fn rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, AuthError> {
        let claims = self.peek(access_token)?;

        if refresh_token.is_empty() {
            return Err(AuthError::RefreshInvalid);
        }

        let pair = self.mint(&claims.sub, claims.roles, &claims.provider)?;
        let ttl = self.refresh_ttl();
        let record_key = self.keys.refresh(&pair.subject, &pair.provider);

        let swapped = self
            .store
            .compare_and_swap(&record_key, refresh_token, &pair.refresh_token, ttl)
            .await
            .map_err(|e| {
                error!(subject = %pair.subject, error = %e, "Token store unavailable during rotation");
                AuthError::RefreshInvalid
            })?;

        if !swapped {
            warn!(subject = %pair.subject, provider = %pair.provider, "Refresh token rejected");
            return Err(AuthError::RefreshInvalid);
        }

        // The refresh record is authoritative; lookup entries are best effort.
        if let Err(e) = self
            .store
            .delete(&self.keys.access_lookup(refresh_token))
            .await
        {
            warn!(error = %e, "Failed to drop stale access token lookup");
        }
        if let Err(e) = self
            .store
            .put(
                &self.keys.access_lookup(&pair.refresh_token),
                &pair.access_token,
                ttl,
            )
            .await
        {
            warn!(error = %e, "Failed to record access token lookup");
        }

        info!(subject = %pair.subject, provider = %pair.provider, "Token pair rotated");

        Ok(pair)
    }

    /// Returns the access token issued together with a still-recorded refresh token.
    ///
    /// Backs `GET /api/auth/session`, which lets a client holding only the
    /// refresh cookie pick its session back up. The token may already be
    /// expired; callers then go through [`TokenManager::rotate`].
    #[instrument(skip_all)]
    pub async fn recover_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<String>, AuthError> {
        let access_token = self
            .store
            .get(&self.keys.access_lookup(refresh_token))
            .await?;

        let Some(access_token) = access_token else {
            return Ok(None);
        };

        // The lookup may outlive a revoked record; confirm against the record.
        let claims = match self.peek(&access_token) {
            Ok(claims) => claims,
            Err(_) => return Ok(None),
        };

        if self
            .validate_refresh(&claims.sub, &claims.provider, refresh_token)
            .await
            .is_ok()
        {
            Ok(Some(access_token))
        } else {
            debug!(subject = %claims.sub, "Lookup entry refers to a superseded refresh token");
            Ok(None)
        }
    }

    /// Deletes the refresh record for `(subject, provider)`; the refresh token
    /// stops validating immediately.
    #[instrument(skip_all, fields(subject = %subject, provider = %provider))]
    pub async fn revoke(&self, subject: &str, provider: &str) -> Result<(), AuthError> {
        let record_key = self.keys.refresh(subject, provider);

        if let Some(current) = self.store.get(&record_key).await? {
            self.store.delete(&self.keys.access_lookup(&current)).await?;
        }
        self.store.delete(&record_key).await?;

        info!("Refresh token revoked");

        Ok(())
    }
}
