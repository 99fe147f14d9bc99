mod common;

use axum::http::StatusCode;
use chrono::{TimeDelta, Utc};
use common::*;
use tower::ServiceExt;
use transport_backend::{infrastructure::TokenCodec, utils::browser_session_cookie};

#[tokio::test]
async fn test_missing_cookie_redirects_to_login() {
    let app = app(state());

    let response = app.oneshot(get("/fleet")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()["location"], "/login?redirect=%2Ffleet");
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_public_paths_pass_without_cookie() {
    let state = state();

    // 未注册的静态资源返回 404 而不是重定向
    for path in ["/login", "/_next/static/app.js", "/favicon.ico", "/logo.png"] {
        let response = app(state.clone()).oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {}", path);
    }
}

#[tokio::test]
async fn test_expired_token_redirects_and_clears_cookie() {
    let state = state();
    let expired = state
        .codec
        .issue_at(&claims(), Utc::now() - TimeDelta::days(2))
        .unwrap();

    let response = app(state)
        .oneshot(get_with_cookie("/api/auth/me", &expired))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()["location"], "/login?redirect=%2Fapi%2Fauth%2Fme");

    let cookie = set_cookie(&response).expect("removal cookie");
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_tampered_token_is_treated_like_expired() {
    let state = state();
    let token = state.codec.issue(&claims()).unwrap();
    let tampered = format!("{}x", token);

    let response = app(state)
        .oneshot(get_with_cookie("/routes", &tampered))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()["location"], "/login?redirect=%2Froutes");
    assert!(set_cookie(&response).is_some());
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let state = state();
    let token = state.codec.issue(&claims()).unwrap();

    let response = app(state)
        .oneshot(get_with_cookie("/api/auth/me", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "99");

    let body = json_body(response).await;
    assert_eq!(body["userId"], "7d9f4c1e-2a3b-4c5d-8e9f-0a1b2c3d4e5f");
    assert_eq!(body["username"], "transport-office");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_authenticated_unknown_path_is_not_found() {
    let state = state();
    let token = state.codec.issue(&claims()).unwrap();

    let response = app(state)
        .oneshot(get_with_cookie("/fleet", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tokens_cross_verify_between_codecs() {
    let portable = state_with_codec("portable");
    let native = state_with_codec("jsonwebtoken");
    let token = portable.codec.issue(&claims()).unwrap();

    let response = app(native)
        .oneshot(get_with_cookie("/api/auth/me", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["username"], "transport-office");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let state = state();
    let token = state.codec.issue(&claims()).unwrap();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header("cookie", cookie_header(&token))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).expect("removal cookie");
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(json_body(response).await["message"], "Logged out successfully");
}

#[tokio::test]
async fn test_browser_session_cookie_is_accepted() {
    let state = state();
    let cookie = browser_session_cookie(state.codec.issue(&claims()).unwrap(), false);
    assert!(cookie.max_age().is_none());

    let response = app(state)
        .oneshot(get_with_cookie("/api/auth/me", cookie.value()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["role"], "admin");
}

#[tokio::test]
async fn test_redirect_target_cannot_inject_parameters() {
    let response = app(state())
        .oneshot(get("/fleet&redirect=//evil"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()["location"],
        "/login?redirect=%2Ffleet%26redirect%3D%2F%2Fevil"
    );
}
