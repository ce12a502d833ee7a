use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use gatekeeper_auth::AuthContext;
use gatekeeper_core::AppError;
use gatekeeper_pipeline::{Chain, FilterDescriptor, SecurityFilter, path_matches};
use tracing::debug;

use crate::metrics::track_authorization_check;

use super::{AUTHORIZATION, JWT_VERIFICATION};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRequirement {
    Public,
    Authenticated,
    Role(String),
}

/// Requirement for every path matching an Ant `pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub pattern: String,
    pub requirement: AccessRequirement,
}

impl AccessRule {
    pub fn public(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            requirement: AccessRequirement::Public,
        }
    }

    pub fn authenticated(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            requirement: AccessRequirement::Authenticated,
        }
    }

    pub fn role(pattern: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            requirement: AccessRequirement::Role(role.into()),
        }
    }
}

/// Rules used when none are configured explicitly. First match wins.
pub fn default_access_rules(admin_role: &str) -> Vec<AccessRule> {
    vec![
        AccessRule::public("/api/auth/**"),
        AccessRule::public("/api/health"),
        AccessRule::public("/api-docs/**"),
        AccessRule::role("/api/admin/**", admin_role),
        AccessRule::authenticated("/api/**"),
    ]
}

/// Checks the request path against ordered [`AccessRule`]s.
///
/// Anonymous callers on a protected path fail authentication; callers
/// lacking the role are forbidden. Paths no rule covers are public.
pub struct AuthorizationFilter {
    descriptor: FilterDescriptor,
    rules: Vec<AccessRule>,
}

impl AuthorizationFilter {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self {
            descriptor: FilterDescriptor::new(AUTHORIZATION, 300).runs_after(JWT_VERIFICATION),
            rules,
        }
    }

    fn requirement(&self, path: &str) -> &AccessRequirement {
        self.rules
            .iter()
            .find(|rule| path_matches(&rule.pattern, path))
            .map(|rule| &rule.requirement)
            .unwrap_or(&AccessRequirement::Public)
    }

    fn check(&self, path: &str, context: Option<&AuthContext>) -> Result<(), AppError> {
        match (self.requirement(path), context) {
            (AccessRequirement::Public, _) => Ok(()),
            (_, None) => Err(AppError::authentication_failed()),
            (AccessRequirement::Authenticated, Some(_)) => Ok(()),
            (AccessRequirement::Role(role), Some(context)) => {
                let allowed = context.has_role(role);
                track_authorization_check(allowed);
                if allowed {
                    Ok(())
                } else {
                    debug!(subject = %context.subject, role = %role, path = %path, "Role missing");
                    Err(AppError::forbidden(anyhow::anyhow!(
                        "Access denied. Required role: {}",
                        role
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl SecurityFilter for AuthorizationFilter {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.descriptor
    }

    async fn apply(&self, request: Request, chain: Chain) -> Result<Response, AppError> {
        self.check(request.uri().path(), request.extensions().get::<AuthContext>())?;
        Ok(chain.proceed(request).await)
    }
}
