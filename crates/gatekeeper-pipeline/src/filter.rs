use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use serde::Serialize;
use utoipa::ToSchema;

use gatekeeper_core::AppError;

use crate::executor::Chain;

/// Identity and ordering declaration of a filter.
///
/// Lower `priority` runs earlier among filters that are otherwise
/// unconstrained; `runs_before` / `runs_after` name other filters and
/// take precedence over priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FilterDescriptor {
    pub id: String,
    pub priority: i32,
    pub runs_before: Option<String>,
    pub runs_after: Option<String>,
}

impl FilterDescriptor {
    pub fn new(id: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            priority,
            runs_before: None,
            runs_after: None,
        }
    }

    pub fn runs_before(mut self, id: impl Into<String>) -> Self {
        self.runs_before = Some(id.into());
        self
    }

    pub fn runs_after(mut self, id: impl Into<String>) -> Self {
        self.runs_after = Some(id.into());
        self
    }
}

/// One stage of request processing.
///
/// `apply` either hands the request on with [`Chain::proceed`] (optionally
/// after attaching request extensions or decorating the response) or
/// returns its own response without proceeding. An `Err` ends the chain and
/// is rendered by the executor.
#[async_trait]
pub trait SecurityFilter: Send + Sync {
    fn descriptor(&self) -> &FilterDescriptor;

    async fn apply(&self, request: Request, chain: Chain) -> Result<Response, AppError>;
}
