use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, instrument};

use gatekeeper_auth::{AuthError, CredentialsRecord, IdentityStore};

/// Reads credentials from `users(login_id text, password_hash text, roles text[])`.
#[derive(Clone, Debug)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    #[instrument(skip(self), fields(db.table = "users"))]
    async fn find_by_subject_identifier(
        &self,
        subject_id: &str,
    ) -> Result<Option<CredentialsRecord>, AuthError> {
        let row: Option<(String, String, Vec<String>)> = sqlx::query_as(
            "SELECT login_id, password_hash, COALESCE(roles, '{}') FROM users WHERE login_id = $1",
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Identity lookup failed");
            AuthError::IdentityStore(e.to_string())
        })?;

        Ok(row.map(|(subject_id, password_hash, roles)| CredentialsRecord {
            subject_id,
            password_hash,
            roles,
        }))
    }
}
