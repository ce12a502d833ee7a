mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::*;
use futures::future::join_all;
use serde_json::json;

fn refresh_request(expired: &str, refresh_cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = refresh_cookie {
        builder = builder.header(header::COOKIE, format!("refreshToken={cookie}"));
    }
    builder
        .body(Body::from(json!({ "expiredToken": expired }).to_string()))
        .unwrap()
}

fn me_with_cookie(access: &str, refresh_cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .header(header::COOKIE, format!("refreshToken={refresh_cookie}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_login_success() {
    let app = setup_test_app();

    let response = app.send(login_request(ALICE, ALICE_PASSWORD)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let authorization = response
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("authorization header");
    assert!(authorization.starts_with("Bearer "));

    let raw_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("set-cookie header");
    assert!(raw_cookie.starts_with("refreshToken="));
    assert!(raw_cookie.contains("HttpOnly"));
    assert!(raw_cookie.contains("Path=/"));
    assert!(raw_cookie.contains("Max-Age=3600"));

    let body = body_json(response).await;
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["subject"], ALICE);
    assert_eq!(body["roles"], json!(["USER"]));
    assert!(body.get("refreshToken").is_none());

    let access = body["accessToken"].as_str().unwrap();
    assert_eq!(authorization, format!("Bearer {access}"));
    let claims = app.state.tokens.verify(access).unwrap();
    assert_eq!(claims.sub, ALICE);
    assert_eq!(claims.provider, "server");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = setup_test_app();

    let wrong_password = app.send(login_request(ALICE, "not-it")).await;
    let unknown_user = app.send(login_request("mallory", ALICE_PASSWORD)).await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong_password.headers().get(header::SET_COOKIE).is_none());

    let wrong_password = body_json(wrong_password).await;
    let unknown_user = body_json(unknown_user).await;
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["code"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn test_login_malformed_credentials() {
    let app = setup_test_app();

    for (login_id, password) in [("", ALICE_PASSWORD), ("null", ALICE_PASSWORD), (ALICE, "")] {
        let response = app.send(login_request(login_id, password)).await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "loginId={login_id:?} password={password:?}"
        );
        let body = body_json(response).await;
        assert_eq!(body["code"], "MALFORMED_REQUEST");
    }

    let garbage = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.send(garbage).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_path_only_intercepts_post() {
    let app = setup_test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/api/auth/login")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_me_with_valid_token() {
    let app = setup_test_app();
    let (access, _) = login(&app, ALICE, ALICE_PASSWORD).await;

    let response = app.send(get_with_token("/api/auth/me", &access)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-new-access-token").is_none());
    let body = body_json(response).await;
    assert_eq!(body["subject"], ALICE);
    assert_eq!(body["provider"], "server");
}

#[tokio::test]
async fn test_me_without_token() {
    let app = setup_test_app();

    let request = Request::builder()
        .uri("/api/auth/me")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn test_forged_token_is_not_refreshed() {
    let app = setup_test_app();
    let (_, refresh) = login(&app, ALICE, ALICE_PASSWORD).await;
    let forged = forged_token(ALICE, &["USER"], &app.state.config.jwt);

    let response = app.send(me_with_cookie(&forged, &refresh)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("x-new-access-token").is_none());
    let body = body_json(response).await;
    assert_eq!(body["code"], "AUTHENTICATION_FAILED");

    // The refresh record was not consumed by the rejected request.
    let expired = expired_token(ALICE, &["USER"], &app.state.config.jwt);
    let response = app.send(refresh_request(&expired, Some(&refresh))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_without_refresh_cookie() {
    let app = setup_test_app();
    login(&app, ALICE, ALICE_PASSWORD).await;
    let expired = expired_token(ALICE, &["USER"], &app.state.config.jwt);

    let response = app.send(get_with_token("/api/auth/me", &expired)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "REFRESH_INVALID");
}

#[tokio::test]
async fn test_expired_token_refreshed_in_flight() {
    let app = setup_test_app();
    let (_, refresh) = login(&app, ALICE, ALICE_PASSWORD).await;
    let expired = expired_token(ALICE, &["USER"], &app.state.config.jwt);

    let response = app.send(me_with_cookie(&expired, &refresh)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let new_access = response
        .headers()
        .get("x-new-access-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("new access token header");
    let new_refresh = set_cookie(&response, "refreshToken").expect("rotated refresh cookie");
    assert_ne!(new_refresh, refresh);

    let body = body_json(response).await;
    assert_eq!(body["subject"], ALICE);
    assert_eq!(body["roles"], json!(["USER"]));

    let claims = app.state.tokens.verify(&new_access).unwrap();
    assert_eq!(claims.sub, ALICE);

    // The superseded refresh token no longer works.
    let response = app.send(me_with_cookie(&expired, &refresh)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "REFRESH_INVALID");

    // The new access token is accepted as is.
    let response = app.send(get_with_token("/api/auth/me", &new_access)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_endpoint_rotates_exactly_once() {
    let app = setup_test_app();
    let (_, refresh) = login(&app, ALICE, ALICE_PASSWORD).await;
    let expired = expired_token(ALICE, &["USER"], &app.state.config.jwt);

    let first = app.send(refresh_request(&expired, Some(&refresh))).await;
    assert_eq!(first.status(), StatusCode::OK);
    let rotated = set_cookie(&first, "refreshToken").expect("rotated cookie");
    let body = body_json(first).await;
    assert_eq!(body["subject"], ALICE);
    assert!(body["accessToken"].as_str().is_some());

    let replay = app.send(refresh_request(&expired, Some(&refresh))).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(replay).await;
    assert_eq!(body["code"], "REFRESH_INVALID");

    let next = app.send(refresh_request(&expired, Some(&rotated))).await;
    assert_eq!(next.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_endpoint_accepts_header_token() {
    let app = setup_test_app();
    let (_, refresh) = login(&app, ALICE, ALICE_PASSWORD).await;
    let expired = expired_token(ALICE, &["USER"], &app.state.config.jwt);

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-refresh-token", refresh)
        .body(Body::from(json!({ "expiredToken": expired }).to_string()))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_endpoint_validation() {
    let app = setup_test_app();

    let missing_cookie = app
        .send(refresh_request(
            &expired_token(ALICE, &["USER"], &app.state.config.jwt),
            None,
        ))
        .await;
    assert_eq!(missing_cookie.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(missing_cookie).await["code"], "REFRESH_INVALID");

    let empty_token = app.send(refresh_request("", Some("whatever"))).await;
    assert_eq!(empty_token.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(empty_token).await["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_concurrent_refresh_has_single_winner() {
    let app = setup_test_app();
    let (_, refresh) = login(&app, ALICE, ALICE_PASSWORD).await;
    let expired = expired_token(ALICE, &["USER"], &app.state.config.jwt);

    let attempts = (0..8).map(|_| app.send(refresh_request(&expired, Some(&refresh))));
    let statuses: Vec<StatusCode> = join_all(attempts)
        .await
        .into_iter()
        .map(|response| response.status())
        .collect();

    let winners = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let losers = statuses
        .iter()
        .filter(|s| **s == StatusCode::UNAUTHORIZED)
        .count();
    assert_eq!(winners, 1, "statuses: {statuses:?}");
    assert_eq!(losers, 7, "statuses: {statuses:?}");
}

#[tokio::test]
async fn test_login_replaces_previous_refresh_token() {
    let app = setup_test_app();
    let (_, first_refresh) = login(&app, ALICE, ALICE_PASSWORD).await;
    let (_, second_refresh) = login(&app, ALICE, ALICE_PASSWORD).await;
    let expired = expired_token(ALICE, &["USER"], &app.state.config.jwt);

    let stale = app.send(refresh_request(&expired, Some(&first_refresh))).await;
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

    let current = app
        .send(refresh_request(&expired, Some(&second_refresh)))
        .await;
    assert_eq!(current.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = setup_test_app();
    let (access, refresh) = login(&app, ALICE, ALICE_PASSWORD).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let raw_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("clearing cookie");
    assert!(raw_cookie.starts_with("refreshToken=;"));
    assert!(raw_cookie.contains("Max-Age=0"));
    assert_eq!(body_json(response).await["message"], "Logged out");

    let expired = expired_token(ALICE, &["USER"], &app.state.config.jwt);
    let response = app.send(refresh_request(&expired, Some(&refresh))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "REFRESH_INVALID");
}

#[tokio::test]
async fn test_logout_without_token_still_clears_cookie() {
    let app = setup_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie(&response, "refreshToken").as_deref(), Some(""));
}

#[tokio::test]
async fn test_public_endpoints_need_no_token() {
    let app = setup_test_app();

    let health = app
        .send(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(health).await["status"], "ok");

    let docs = app
        .send(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(docs.status(), StatusCode::OK);
    let docs = body_json(docs).await;
    assert!(docs["paths"].get("/api/auth/refresh").is_some());
    assert!(docs["paths"].get("/api/admin/filters").is_some());
}

#[tokio::test]
async fn test_public_path_ignores_garbage_token() {
    let app = setup_test_app();

    let response = app
        .send(get_with_token("/api/health", "definitely.not.a-jwt"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

fn session_request(refresh_cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/api/auth/session");
    if let Some(cookie) = refresh_cookie {
        builder = builder.header(header::COOKIE, format!("refreshToken={cookie}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_session_recovers_access_token_from_refresh_cookie() {
    let app = setup_test_app();
    let (access, refresh) = login(&app, ALICE, ALICE_PASSWORD).await;

    let response = app.send(session_request(Some(&refresh))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accessToken"], access);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["subject"], ALICE);
    assert_eq!(body["roles"], json!(["USER"]));
    let expires_in = body["expiresIn"].as_i64().unwrap();
    assert!(expires_in > 0 && expires_in <= 900);
}

#[tokio::test]
async fn test_session_follows_rotation_and_logout() {
    let app = setup_test_app();
    let (access, refresh) = login(&app, ALICE, ALICE_PASSWORD).await;
    let expired = expired_token(ALICE, &["USER"], &app.state.config.jwt);

    let rotated = app.send(refresh_request(&expired, Some(&refresh))).await;
    let rotated_refresh = set_cookie(&rotated, "refreshToken").unwrap();
    let rotated_access = body_json(rotated).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(rotated_access, access);

    let stale = app.send(session_request(Some(&refresh))).await;
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(stale).await["code"], "REFRESH_INVALID");

    let current = app.send(session_request(Some(&rotated_refresh))).await;
    assert_eq!(current.status(), StatusCode::OK);
    assert_eq!(body_json(current).await["accessToken"], rotated_access);

    let logout = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {rotated_access}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(logout).await.status(), StatusCode::OK);

    let revoked = app.send(session_request(Some(&rotated_refresh))).await;
    assert_eq!(revoked.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_without_refresh_cookie() {
    let app = setup_test_app();

    let response = app.send(session_request(None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "REFRESH_INVALID");
}
