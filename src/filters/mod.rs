//! Security filters installed into the pipeline at startup.
//!
//! | id | priority | constraint |
//! |----|----------|------------|
//! | `authentication` | 100 | runs before `jwt_verification` |
//! | `jwt_verification` | 200 | |
//! | `authorization` | 300 | runs after `jwt_verification` |

pub mod authentication;
pub mod authorization;
pub mod jwt_verification;

use std::sync::Arc;

use gatekeeper_auth::{IdentityStore, TokenManager};
use gatekeeper_config::{CookieConfig, GatewayConfig};
use gatekeeper_pipeline::{Condition, FilterRegistry, RegistryError};
use tracing::info;

pub use authentication::AuthenticationFilter;
pub use authorization::{AccessRequirement, AccessRule, AuthorizationFilter, default_access_rules};
pub use jwt_verification::JwtVerificationFilter;

pub const AUTHENTICATION: &str = "authentication";
pub const JWT_VERIFICATION: &str = "jwt_verification";
pub const AUTHORIZATION: &str = "authorization";

/// Id of the condition exempting `PUBLIC_PATHS` from token verification.
pub const PUBLIC_PATHS_CONDITION: &str = "public-paths";

/// Registers the three standard filters and the public-paths bypass.
pub fn install_default_filters(
    registry: &FilterRegistry,
    identity_store: Arc<dyn IdentityStore>,
    tokens: &TokenManager,
    cookie_config: &CookieConfig,
    gateway: &GatewayConfig,
    rules: Vec<AccessRule>,
) -> Result<(), RegistryError> {
    registry.register(Arc::new(AuthenticationFilter::new(
        gateway.login_path.clone(),
        identity_store,
        tokens.clone(),
        cookie_config.clone(),
    )))?;
    registry.register(Arc::new(JwtVerificationFilter::new(
        tokens.clone(),
        cookie_config.clone(),
        gateway.access_token_cookie_fallback,
    )))?;
    registry.register(Arc::new(AuthorizationFilter::new(rules)))?;

    if !gateway.public_paths.is_empty() {
        let public = Condition::path(gateway.public_paths.as_slice(), &[], "Public endpoints")?;
        let public = public.named(PUBLIC_PATHS_CONDITION);
        registry.add_condition(JWT_VERIFICATION, public)?;
    }

    info!(order = ?registry.resolved_order(), "Security filters installed");

    Ok(())
}
