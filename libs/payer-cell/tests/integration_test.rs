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

use payer_cell::router::payer_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils};

fn config_for(mock_server: &MockServer) -> AppConfig {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    config
}

async fn create_test_app(config: AppConfig) -> Router {
    payer_routes(Arc::new(config))
}

fn payer_row(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Granite State Health Plan",
        "payer_type": "commercial",
        "state": "NH",
        "status_code": "approved",
        "effective_date": "2025-01-01",
        "requires_attending": true,
        "allows_supervised": true,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn provider_row(id: &str, first: &str, last: &str, role: &str) -> serde_json::Value {
    json!({
        "id": id,
        "first_name": first,
        "last_name": last,
        "email": format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        "role": role,
        "npi": null,
        "is_active": true,
        "is_bookable": true,
        "accepts_new_patients": true,
        "offers_telehealth": true,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_bookable_providers_endpoint_returns_supervised_resident() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);

    let payer_id = Uuid::new_v4().to_string();
    let attending_id = Uuid::new_v4().to_string();
    let resident_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/payers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([payer_row(&payer_id)])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            provider_row(&attending_id, "Alice", "Arnett", "attending"),
            provider_row(&resident_id, "Rafael", "Reyes", "resident")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/provider_payer_contracts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "provider_id": attending_id,
            "payer_id": payer_id,
            "status": "in_network",
            "effective_date": "2025-01-01",
            "expiration_date": null,
            "bookable_from_date": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/supervision_relationships"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "supervisor_id": attending_id,
            "supervisee_id": resident_id,
            "payer_id": payer_id,
            "is_active": true,
            "start_date": "2025-01-01",
            "end_date": null,
            "created_at": "2024-01-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("GET")
        .uri(&format!("/{}/bookable-providers?date=2025-06-01", payer_id))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["total"], 2);

    let providers = json_response["providers"].as_array().unwrap();
    let resident = providers.iter()
        .find(|p| p["provider_id"] == resident_id.as_str())
        .expect("resident should be in the bookable set");

    assert_eq!(resident["network_status"], "supervised");
    assert_eq!(resident["supervising_attendings"][0], "Alice Arnett");
    assert_eq!(resident["billing_provider_id"], attending_id.as_str());
}

#[tokio::test]
async fn test_sanity_check_text_format() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let payer_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/payers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([payer_row(&payer_id)])))
        .mount(&mock_server)
        .await;

    // Everything else degrades to empty
    for table in ["providers", "provider_payer_contracts", "supervision_relationships"] {
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{}", table)))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;
    }

    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("GET")
        .uri(&format!("/{}/sanity-check?as_of=2025-06-01&format=text", payer_id))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("Granite State Health Plan"));
    assert!(text.contains("Bookable providers today: 0"));
}

#[tokio::test]
async fn test_unknown_payer_is_404() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/payers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let user = TestUser::staff("coordinator@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("GET")
        .uri(&format!("/{}/bookable-providers?date=2025-06-01", Uuid::new_v4()))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
