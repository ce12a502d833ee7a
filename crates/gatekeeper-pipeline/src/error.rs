use anyhow::anyhow;
use gatekeeper_core::AppError;

use crate::order::CycleError;

/// A condition definition that cannot be built.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid condition: {0}")]
pub struct ConditionError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Registration refused; the previous order stays in effect.
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Unknown condition {condition_id} on filter {filter_id}")]
    UnknownCondition {
        filter_id: String,
        condition_id: String,
    },

    #[error(transparent)]
    InvalidCondition(#[from] ConditionError),
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Cycle(e) => AppError::order_conflict(e),
            RegistryError::UnknownFilter(_) | RegistryError::UnknownCondition { .. } => {
                AppError::not_found(anyhow!(err.to_string()))
            }
            RegistryError::InvalidCondition(e) => AppError::unprocessable(e),
        }
    }
}
