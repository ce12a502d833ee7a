use async_trait::async_trait;
use dashmap::DashMap;
use gatekeeper_core::password::verify_password_or_dummy;
use tracing::debug;

use crate::error::AuthError;

/// Identifiers some clients send in place of a real value.
const PLACEHOLDER_IDENTIFIERS: [&str; 3] = ["null", "undefined", "NONE_PROVIDED"];

/// Stored credentials of one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialsRecord {
    pub subject_id: String,
    /// bcrypt hash of the secret.
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// Lookup of credentials by subject identifier, consulted only at login.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_subject_identifier(
        &self,
        subject_id: &str,
    ) -> Result<Option<CredentialsRecord>, AuthError>;
}

/// Identity store held in memory, for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    records: DashMap<String, CredentialsRecord>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a subject. `password_hash` must already be a bcrypt hash.
    pub fn insert(&self, subject_id: &str, password_hash: &str, roles: Vec<String>) {
        self.records.insert(
            subject_id.to_string(),
            CredentialsRecord {
                subject_id: subject_id.to_string(),
                password_hash: password_hash.to_string(),
                roles,
            },
        );
    }

    pub fn remove(&self, subject_id: &str) -> bool {
        self.records.remove(subject_id).is_some()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_subject_identifier(
        &self,
        subject_id: &str,
    ) -> Result<Option<CredentialsRecord>, AuthError> {
        Ok(self.records.get(subject_id).map(|r| r.value().clone()))
    }
}

/// Rejects blank and placeholder identifiers before any store lookup.
pub fn validate_login_id(login_id: &str) -> Result<&str, AuthError> {
    let trimmed = login_id.trim();
    if trimmed.is_empty() || PLACEHOLDER_IDENTIFIERS.contains(&trimmed) {
        return Err(AuthError::MalformedRequest(
            "loginId must be provided".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Checks `password` for `login_id` against `store`.
///
/// Unknown subjects and wrong secrets both yield
/// [`AuthError::AuthenticationFailed`], after the same amount of bcrypt work.
pub async fn authenticate(
    store: &dyn IdentityStore,
    login_id: &str,
    password: &str,
) -> Result<CredentialsRecord, AuthError> {
    let login_id = validate_login_id(login_id)?;
    if password.is_empty() {
        return Err(AuthError::MalformedRequest(
            "password must be provided".to_string(),
        ));
    }

    let record = store.find_by_subject_identifier(login_id).await?;
    let hash = record.as_ref().map(|r| r.password_hash.as_str());

    let valid = verify_password_or_dummy(password, hash)
        .map_err(|e| AuthError::IdentityStore(e.error.to_string()))?;

    match record {
        Some(record) if valid => Ok(record),
        _ => {
            debug!(login_id = %login_id, "Credential check failed");
            Err(AuthError::AuthenticationFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_alice() -> InMemoryIdentityStore {
        let store = InMemoryIdentityStore::new();
        let hash = bcrypt::hash("wonderland", 4).unwrap();
        store.insert("alice", &hash, vec!["USER".to_string()]);
        store
    }

    #[test]
    fn test_validate_login_id_rejects_placeholders() {
        for bad in ["", "   ", "null", "undefined", "NONE_PROVIDED"] {
            assert!(matches!(
                validate_login_id(bad),
                Err(AuthError::MalformedRequest(_))
            ));
        }
        assert_eq!(validate_login_id(" alice ").unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let store = store_with_alice();
        let record = authenticate(&store, "alice", "wonderland").await.unwrap();
        assert_eq!(record.subject_id, "alice");
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_uniform() {
        let store = store_with_alice();

        let wrong_secret = authenticate(&store, "alice", "looking-glass").await;
        let unknown_subject = authenticate(&store, "mallory", "wonderland").await;

        assert!(matches!(wrong_secret, Err(AuthError::AuthenticationFailed)));
        assert!(matches!(unknown_subject, Err(AuthError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_authenticate_requires_password() {
        let store = store_with_alice();
        assert!(matches!(
            authenticate(&store, "alice", "").await,
            Err(AuthError::MalformedRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryIdentityStore::new();
        store.insert("alice", "$2b$04$hash", vec!["USER".to_string()]);

        let record = store
            .find_by_subject_identifier("alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.subject_id, "alice");
        assert_eq!(record.roles, vec!["USER".to_string()]);

        assert!(
            store
                .find_by_subject_identifier("bob")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryIdentityStore::new();
        store.insert("alice", "$2b$04$hash", vec![]);

        assert!(store.remove("alice"));
        assert!(!store.remove("alice"));
        assert!(
            store
                .find_by_subject_identifier("alice")
                .await
                .unwrap()
                .is_none()
        );
    }
}
