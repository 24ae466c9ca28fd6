use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use auth_cell::router::auth_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils};

fn test_config() -> AppConfig {
    TestConfig::default().to_app_config()
}

async fn create_test_app(config: AppConfig) -> Router {
    auth_routes(Arc::new(config))
}

async fn post_validate(app: Router, token: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();
    (status, json)
}

#[tokio::test]
async fn test_validate_accepts_a_good_token() {
    let config = test_config();
    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let app = create_test_app(config).await;
    let (status, body) = post_validate(app, &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["user_id"], user.id);
    assert_eq!(body["email"], "coordinator@example.com");
}

#[tokio::test]
async fn test_validate_rejects_expired_token() {
    let config = test_config();
    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &config.supabase_jwt_secret);

    let app = create_test_app(config).await;
    let (status, _) = post_validate(app, &token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validate_rejects_wrong_signature() {
    let config = test_config();
    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_invalid_signature_token(&user);

    let app = create_test_app(config).await;
    let (status, _) = post_validate(app, &token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_reports_invalid_without_erroring() {
    let config = test_config();
    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("POST")
        .uri("/verify")
        .header("Authorization", format!("Bearer {}", JwtTestUtils::create_malformed_token()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["valid"], false);
}

#[tokio::test]
async fn test_profile_requires_authentication() {
    let config = test_config();
    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("GET")
        .uri("/profile")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
