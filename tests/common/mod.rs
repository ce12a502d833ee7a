#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use gatekeeper::filters::{AccessRule, default_access_rules};
use gatekeeper::router::init_router;
use gatekeeper::state::{AppConfig, AppState};
use gatekeeper_auth::{AccessClaims, InMemoryIdentityStore};
use gatekeeper_cache::{CacheConfig, MemoryTokenStore, StoreBackend};
use gatekeeper_config::{CookieConfig, CorsConfig, GatewayConfig, JwtConfig, SameSite};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const ALICE: &str = "alice";
pub const ALICE_PASSWORD: &str = "wonderland-123";
pub const ADMIN: &str = "root";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub identities: Arc<InMemoryIdentityStore>,
    pub token_store: Arc<MemoryTokenStore>,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt: JwtConfig {
            secret: "test-secret-key-for-integration-tests".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 3600,
            issuer: "gatekeeper".to_string(),
        },
        cookie: CookieConfig {
            domain: "localhost".to_string(),
            secure: false,
            same_site: SameSite::Lax,
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        gateway: GatewayConfig::default(),
        cache: CacheConfig {
            backend: StoreBackend::Memory,
            ..CacheConfig::default()
        },
    }
}

/// Identity store seeded with `alice` (USER) and `root` (ADMIN).
pub fn seeded_identities() -> Arc<InMemoryIdentityStore> {
    let identities = Arc::new(InMemoryIdentityStore::new());
    identities.insert(
        ALICE,
        &bcrypt::hash(ALICE_PASSWORD, 4).unwrap(),
        vec!["USER".to_string()],
    );
    identities.insert(
        ADMIN,
        &bcrypt::hash(ADMIN_PASSWORD, 4).unwrap(),
        vec!["ROLE_ADMIN".to_string(), "USER".to_string()],
    );
    identities
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config())
}

pub fn setup_test_app_with(config: AppConfig) -> TestApp {
    let rules = default_access_rules(&config.gateway.admin_role);
    setup_test_app_with_rules(config, rules)
}

pub fn setup_test_app_with_rules(config: AppConfig, rules: Vec<AccessRule>) -> TestApp {
    let identities = seeded_identities();
    let token_store = Arc::new(MemoryTokenStore::new());
    let state =
        AppState::with_access_rules(config, token_store.clone(), identities.clone(), rules)
            .unwrap();

    TestApp {
        router: init_router(state.clone()),
        state,
        identities,
        token_store,
    }
}

pub fn login_request(login_id: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "loginId": login_id, "password": password }).to_string(),
        ))
        .unwrap()
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Value of cookie `name` from the response's `Set-Cookie` headers.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Logs in and returns `(access_token, refresh_token)`.
pub async fn login(app: &TestApp, login_id: &str, password: &str) -> (String, String) {
    let response = app.send(login_request(login_id, password)).await;
    assert_eq!(response.status(), 200, "login failed for {login_id}");
    let refresh = set_cookie(&response, "refreshToken").expect("refresh cookie");
    let body = body_json(response).await;
    (body["accessToken"].as_str().unwrap().to_string(), refresh)
}

/// A correctly signed access token that expired a minute ago.
pub fn expired_token(subject: &str, roles: &[&str], config: &JwtConfig) -> String {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = AccessClaims {
        sub: subject.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        provider: "server".to_string(),
        iss: config.issuer.clone(),
        iat: now - 960,
        exp: now - 60,
        jti: format!("expired-{subject}-{now}"),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .unwrap()
}

/// A token with the right shape signed with the wrong key.
pub fn forged_token(subject: &str, roles: &[&str], config: &JwtConfig) -> String {
    let mut forged = config.clone();
    forged.secret = "not-the-secret".to_string();
    gatekeeper_auth::create_access_token(
        subject,
        &roles.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
        "server",
        &forged,
    )
    .unwrap()
}
