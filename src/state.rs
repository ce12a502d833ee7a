use std::sync::Arc;

use gatekeeper_auth::{IdentityStore, InMemoryIdentityStore, TokenManager};
use gatekeeper_cache::{CacheConfig, TokenKeys, TokenStore};
use gatekeeper_config::{CookieConfig, CorsConfig, GatewayConfig, JwtConfig};
use gatekeeper_db::{PgIdentityStore, init_db_pool};
use gatekeeper_pipeline::{FilterRegistry, RegistryError};
use tracing::{info, warn};

use crate::filters::{AccessRule, default_access_rules, install_default_filters};

/// Configuration read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub cors: CorsConfig,
    pub gateway: GatewayConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            cookie: CookieConfig::from_env(),
            cors: CorsConfig::from_env(),
            gateway: GatewayConfig::from_env(),
            cache: CacheConfig::from_env(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub tokens: TokenManager,
    pub identity_store: Arc<dyn IdentityStore>,
    pub registry: Arc<FilterRegistry>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .field("filters", &self.registry.resolved_order())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wires the token manager and installs the standard filters with the
    /// default access rules.
    pub fn new(
        config: AppConfig,
        token_store: Arc<dyn TokenStore>,
        identity_store: Arc<dyn IdentityStore>,
    ) -> Result<Self, RegistryError> {
        let rules = default_access_rules(&config.gateway.admin_role);
        Self::with_access_rules(config, token_store, identity_store, rules)
    }

    pub fn with_access_rules(
        config: AppConfig,
        token_store: Arc<dyn TokenStore>,
        identity_store: Arc<dyn IdentityStore>,
        rules: Vec<AccessRule>,
    ) -> Result<Self, RegistryError> {
        let tokens = TokenManager::new(
            token_store,
            TokenKeys::new(config.cache.key_prefix.clone()),
            config.jwt.clone(),
        );

        let registry = Arc::new(FilterRegistry::new());
        install_default_filters(
            &registry,
            Arc::clone(&identity_store),
            &tokens,
            &config.cookie,
            &config.gateway,
            rules,
        )?;

        Ok(Self {
            config,
            tokens,
            identity_store,
            registry,
        })
    }
}

/// Builds the state from the environment, connecting to the token store and,
/// when `DATABASE_URL` is set, to PostgreSQL.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let token_store = gatekeeper_cache::connect(&config.cache).await?;

    let identity_store: Arc<dyn IdentityStore> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = init_db_pool(&database_url).await?;
            info!("Using PostgreSQL identity store");
            Arc::new(PgIdentityStore::new(pool))
        }
        Err(_) => {
            warn!("DATABASE_URL not set; using an empty in-memory identity store");
            Arc::new(InMemoryIdentityStore::new())
        }
    };

    Ok(AppState::new(config, token_store, identity_store)?)
}
