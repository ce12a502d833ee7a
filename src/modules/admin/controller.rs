use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use gatekeeper_core::AppError;
use gatekeeper_pipeline::ConditionInfo;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    AddConditionRequest, FilterListResponse, FilterStatusResponse, StatusParams,
    ToggleConditionRequest,
};
use super::service::AdminService;

/// List registered filters in execution order with their conditions
#[utoipa::path(
    get,
    path = "/api/admin/filters",
    responses(
        (status = 200, description = "Registered filters", body = FilterListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Filters"
)]
pub async fn list_filters(State(state): State<AppState>) -> Json<FilterListResponse> {
    Json(AdminService::list_filters(&state.registry))
}

/// Attach a bypass condition to a filter
#[utoipa::path(
    post,
    path = "/api/admin/filters/{filter_id}/conditions",
    params(("filter_id" = String, Path, description = "Filter id")),
    request_body = AddConditionRequest,
    responses(
        (status = 201, description = "Condition attached", body = ConditionInfo),
        (status = 404, description = "Unknown filter", body = ErrorResponse),
        (status = 422, description = "Invalid condition definition", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Filters"
)]
#[instrument(skip_all, fields(admin = %admin.subject()))]
pub async fn add_condition(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(filter_id): Path<String>,
    ValidatedJson(dto): ValidatedJson<AddConditionRequest>,
) -> Result<(StatusCode, Json<ConditionInfo>), AppError> {
    let info = AdminService::add_condition(&state.registry, &filter_id, dto)?;
    Ok((StatusCode::CREATED, Json(info)))
}

/// Enable or disable a single condition without removing it
#[utoipa::path(
    patch,
    path = "/api/admin/filters/{filter_id}/conditions/{condition_id}",
    params(
        ("filter_id" = String, Path, description = "Filter id"),
        ("condition_id" = String, Path, description = "Condition id")
    ),
    request_body = ToggleConditionRequest,
    responses(
        (status = 200, description = "Condition updated", body = ConditionInfo),
        (status = 404, description = "Unknown filter or condition", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Filters"
)]
#[instrument(skip_all, fields(admin = %admin.subject()))]
pub async fn toggle_condition(
    State(state): State<AppState>,
    admin: AuthUser,
    Path((filter_id, condition_id)): Path<(String, String)>,
    ValidatedJson(dto): ValidatedJson<ToggleConditionRequest>,
) -> Result<Json<ConditionInfo>, AppError> {
    let info =
        AdminService::set_condition_enabled(&state.registry, &filter_id, &condition_id, dto.enabled)?;
    Ok(Json(info))
}

/// Detach a condition from a filter
#[utoipa::path(
    delete,
    path = "/api/admin/filters/{filter_id}/conditions/{condition_id}",
    params(
        ("filter_id" = String, Path, description = "Filter id"),
        ("condition_id" = String, Path, description = "Condition id")
    ),
    responses(
        (status = 204, description = "Condition removed"),
        (status = 404, description = "Unknown filter or condition", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Filters"
)]
#[instrument(skip_all, fields(admin = %admin.subject()))]
pub async fn remove_condition(
    State(state): State<AppState>,
    admin: AuthUser,
    Path((filter_id, condition_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    AdminService::remove_condition(&state.registry, &filter_id, &condition_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Switch a filter on or off
#[utoipa::path(
    post,
    path = "/api/admin/filters/{filter_id}/status",
    params(
        ("filter_id" = String, Path, description = "Filter id"),
        StatusParams
    ),
    responses(
        (status = 200, description = "Filter status changed", body = FilterStatusResponse),
        (status = 404, description = "Unknown filter", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Filters"
)]
#[instrument(skip_all, fields(admin = %admin.subject()))]
pub async fn set_filter_status(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(filter_id): Path<String>,
    Query(params): Query<StatusParams>,
) -> Result<Json<FilterStatusResponse>, AppError> {
    let response = AdminService::set_filter_status(&state.registry, &filter_id, params.action)?;
    Ok(Json(response))
}
