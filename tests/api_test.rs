//! API integration tests
//!
//! One-shot requests against the router, backed by in-memory stores and a
//! scripted gateway.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`
use uuid::Uuid;

use common::*;
use outdial::interface::api::{build_router, AppState};

fn app(h: &Harness) -> Router {
    let state = AppState {
        dispatcher: h.dispatcher.clone(),
        scheduler: h.scheduler(),
        campaigns: h.campaigns.clone(),
    };
    build_router(state, None)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness(FakeGateway::answering());

    let response = app(&h)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_dispatch_batch() {
    let h = harness(FakeGateway::answering());

    let payload = json!({
        "userId": Uuid::new_v4(),
        "campaignName": "API Promo",
        "promptId": Uuid::new_v4(),
        "phoneNumbers": ["0123456781", "0123456782", "123"],
        "phoneNumbersWithNames": [
            {"phone_number": "0123456781", "customer_name": "Aminah"}
        ],
        "retryEnabled": true,
        "retryIntervalMinutes": 30,
        "maxRetryAttempts": 3
    });

    let response = app(&h).oneshot(post_json("/dispatch", &payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["summary"]["successful_calls"], 2);
    assert_eq!(json["summary"]["failed_calls"], 0);
    assert_eq!(json["callRecordIds"].as_array().unwrap().len(), 2);
    assert_eq!(json["invalidNumbers"], 1);
}

#[tokio::test]
async fn test_dispatch_rejects_all_invalid_numbers() {
    let h = harness(FakeGateway::answering());

    let payload = json!({
        "userId": Uuid::new_v4(),
        "campaignName": "API Promo",
        "promptId": Uuid::new_v4(),
        "phoneNumbers": ["123", "45"]
    });

    let response = app(&h).oneshot(post_json("/dispatch", &payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("phone numbers"));
    assert!(json["details"].is_string());
}

#[tokio::test]
async fn test_dispatch_rejects_malformed_body() {
    let h = harness(FakeGateway::answering());

    let response = app(&h)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/dispatch")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_dispatch_without_entitlement_is_forbidden() {
    let h = denied_harness(FakeGateway::answering());

    let payload = json!({
        "userId": Uuid::new_v4(),
        "campaignName": "API Promo",
        "promptId": Uuid::new_v4(),
        "phoneNumbers": ["0123456789"]
    });

    let response = app(&h).oneshot(post_json("/dispatch", &payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_scheduler_run_with_nothing_due() {
    let h = harness(FakeGateway::answering());

    // Nothing eligible is a normal 200, not an error.
    let response = app(&h)
        .oneshot(post_json("/scheduler/run", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["retriedCalls"], 0);
}

#[tokio::test]
async fn test_get_campaign_aggregates() {
    let h = harness(FakeGateway::answering());

    let payload = json!({
        "userId": Uuid::new_v4(),
        "campaignName": "API Promo",
        "promptId": Uuid::new_v4(),
        "phoneNumbers": ["0123456781", "0123456782"]
    });
    let app_router = app(&h);
    let dispatch_response = app_router
        .clone()
        .oneshot(post_json("/dispatch", &payload))
        .await
        .unwrap();
    let dispatch_json = body_json(dispatch_response).await;
    let campaign_id = dispatch_json["campaignId"].as_str().unwrap().to_string();

    let response = app_router
        .oneshot(
            Request::builder()
                .uri(format!("/campaigns/{}", campaign_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["campaign_name"], "API Promo");
    assert_eq!(json["successful_calls"], 2);
    assert_eq!(json["total_numbers"], 2);
}

#[tokio::test]
async fn test_get_unknown_campaign_is_404() {
    let h = harness(FakeGateway::answering());

    let response = app(&h)
        .oneshot(
            Request::builder()
                .uri(format!("/campaigns/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
