use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use gatekeeper_auth::AuthContext;
use gatekeeper_pipeline::{ConditionInfo, ConditionKind};

use crate::modules::admin::model::{
    AddConditionRequest, FilterInfo, FilterListResponse, FilterStatusResponse, StatusAction,
    ToggleConditionRequest,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{LoginRequest, MessageResponse, RefreshRequest, TokenResponse};
use crate::modules::health::controller::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_unavailable,
        crate::modules::auth::controller::refresh_tokens,
        crate::modules::auth::controller::session,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::me,
        crate::modules::admin::controller::list_filters,
        crate::modules::admin::controller::add_condition,
        crate::modules::admin::controller::toggle_condition,
        crate::modules::admin::controller::remove_condition,
        crate::modules::admin::controller::set_filter_status,
        crate::modules::health::controller::health,
    ),
    components(
        schemas(
            LoginRequest,
            TokenResponse,
            RefreshRequest,
            MessageResponse,
            AuthContext,
            ErrorResponse,
            FilterInfo,
            FilterListResponse,
            AddConditionRequest,
            ToggleConditionRequest,
            StatusAction,
            FilterStatusResponse,
            ConditionInfo,
            ConditionKind,
            HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token refresh and logout"),
        (name = "Filters", description = "Runtime management of the security pipeline"),
        (name = "Health", description = "Service health checks")
    ),
    info(
        title = "Gatekeeper API",
        version = "0.1.0",
        description = "Authentication gateway with a dependency-ordered security filter pipeline and rotating refresh tokens.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
