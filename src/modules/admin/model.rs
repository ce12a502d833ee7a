use gatekeeper_pipeline::{ConditionInfo, ConditionKind};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// One registered filter and the conditions attached to it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterInfo {
    pub id: String,
    pub priority: i32,
    pub runs_before: Option<String>,
    pub runs_after: Option<String>,
    pub conditions: Vec<ConditionInfo>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterListResponse {
    /// Filter ids in execution order.
    pub resolved_order: Vec<String>,
    pub filters: Vec<FilterInfo>,
}

/// New bypass condition for a filter.
///
/// `path` uses `patterns` and optional `methods`; `header` uses `header` and
/// an optional `valuePattern` regex; `address` uses an IP or CIDR `address`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddConditionRequest {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    #[validate(length(max = 256, message = "description is too long"))]
    pub description: Option<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    pub header: Option<String>,
    pub value_pattern: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ToggleConditionRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusAction {
    Enable,
    Disable,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusParams {
    pub action: StatusAction,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterStatusResponse {
    pub filter_id: String,
    pub enabled: bool,
    pub condition: ConditionInfo,
}
