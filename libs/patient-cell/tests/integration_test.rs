use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path};

use patient_cell::router::patient_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils};

fn config_for(mock_server: &MockServer) -> AppConfig {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    config
}

async fn create_test_app(config: AppConfig) -> Router {
    patient_routes(Arc::new(config))
}

fn patient_response(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "first_name": "Jordan",
        "last_name": "Ellis",
        "email": "jordan.ellis@example.com",
        "phone_number": "603-555-0188",
        "date_of_birth": "1991-03-14",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_engagement_status_no_op_performs_no_write() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_response(&patient_id)
        ])))
        .mount(&mock_server)
        .await;

    // Patient is currently discharged
    Mock::given(method("GET"))
        .and(path("/rest/v1/engagement_statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "patient_id": patient_id,
            "status": "discharged",
            "changed_by_email": "coordinator@example.com",
            "change_reason": "completed treatment",
            "changed_at": "2024-06-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    // A matching PUT must never write: zero upserts, zero notifications,
    // zero view refreshes.
    Mock::given(method("POST"))
        .and(path("/rest/v1/engagement_statuses"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/refresh_patient_roster"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock_server)
        .await;

    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}/engagement-status", patient_id))
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({
            "status": "discharged",
            "changed_by_email": "coordinator@example.com"
        }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["changed"], false);
    assert_eq!(json_response["status"], "discharged");
    assert_eq!(json_response["previous_status"], "discharged");
}

#[tokio::test]
async fn test_engagement_status_change_writes_and_refreshes_view() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_response(&patient_id)
        ])))
        .mount(&mock_server)
        .await;

    // No status row yet: implicitly active
    Mock::given(method("GET"))
        .and(path("/rest/v1/engagement_statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/engagement_statuses"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "patient_id": patient_id,
            "status": "unresponsive",
            "changed_by_email": "coordinator@example.com",
            "change_reason": "three missed appointments",
            "changed_at": "2024-06-01T00:00:00Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Non-admin actor moving the patient out of active flags a notification
    Mock::given(method("POST"))
        .and(path("/rest/v1/admin_notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/refresh_patient_roster"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}/engagement-status", patient_id))
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({
            "status": "unresponsive",
            "changed_by_email": "coordinator@example.com",
            "change_reason": "three missed appointments"
        }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["changed"], true);
    assert_eq!(json_response["previous_status"], "active");
    assert_eq!(json_response["status"], "unresponsive");
}

#[tokio::test]
async fn test_missing_reason_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_response(&patient_id)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/engagement_statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}/engagement-status", patient_id))
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({
            "status": "inactive",
            "changed_by_email": "coordinator@example.com"
        }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_patient_is_404() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("GET")
        .uri(&format!("/{}/engagement-status", Uuid::new_v4()))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
