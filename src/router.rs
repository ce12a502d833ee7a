use std::any::Any;

use crate::docs::openapi_json;
use crate::logging::{REQUEST_ID_HEADER, logging_middleware};
use crate::metrics::metrics_middleware;
use crate::modules::admin::router::init_admin_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::health::router::init_health_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Router, middleware};
use gatekeeper_core::AppError;
use gatekeeper_pipeline::{PipelineExecutor, security_pipeline};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::error;

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Request handler panicked");
    AppError::internal(anyhow::anyhow!("panic: {}", detail)).into_response()
}

async fn route_not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Route not found"))
}

/// Application router.
///
/// Every request, including unmatched ones, passes through the security
/// pipeline before reaching a handler.
pub fn init_router(state: AppState) -> Router {
    let executor = PipelineExecutor::new(
        state.registry.clone(),
        state.config.gateway.trust_forwarded_for,
    );

    Router::new()
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .nest("/admin", init_admin_router(state.clone()))
                .nest("/health", init_health_router()),
        )
        .fallback(route_not_found)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(executor, security_pipeline))
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .config
                .cors
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .expose_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::HeaderName::from_static(crate::utils::tokens::NEW_ACCESS_TOKEN_HEADER),
                    axum::http::HeaderName::from_static(REQUEST_ID_HEADER),
                ])
                .allow_credentials(true)
        })
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
