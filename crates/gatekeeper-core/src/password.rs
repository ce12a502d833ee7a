use std::sync::LazyLock;

use anyhow::anyhow;
use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

/// Hash compared against when the subject does not exist, so an unknown
/// identifier costs the same bcrypt work as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash("gatekeeper-dummy-password", DEFAULT_COST).ok());

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal(anyhow!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow!("Failed to verify password: {}", e)))
}

/// Verifies `password` against `hash`, or against a dummy hash when `hash` is
/// `None`. Always returns `false` in the latter case.
pub fn verify_password_or_dummy(password: &str, hash: Option<&str>) -> Result<bool, AppError> {
    match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify(password, dummy);
            }
            Ok(false)
        }
    }
}
