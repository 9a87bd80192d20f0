//! Webhook endpoint integration tests

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{event, webhook_request, StubBackend, TestApp, API_KEY};
use serde_json::json;
use voicebank::domain::call::{CallState, UNKNOWN_PHONE};

#[tokio::test]
async fn test_call_started_creates_call() {
    let app = TestApp::new(StubBackend::new());
    let body = event("call_started", json!({"call_id": "c2"}));

    let (status, json) = app.send(webhook_request(API_KEY, &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"received": true}));

    let call = app.calls.get_call("c2").await.unwrap();
    assert_eq!(call.state, CallState::CallStarted);
    assert_eq!(call.phone_number, UNKNOWN_PHONE);
    assert!(call.metadata("retell_data").is_some());
}

#[tokio::test]
async fn test_wrong_key_is_rejected() {
    let app = TestApp::new(StubBackend::new());
    let body = event("call_started", json!({"call_id": "c2"}));

    let (status, json) = app.send(webhook_request("some-other-key", &body)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["status"], 401);
    assert_eq!(app.calls.count_calls().await, 0);
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let app = TestApp::new(StubBackend::new());
    let signed = event("call_started", json!({"call_id": "c2"}));
    let tampered = event("call_started", json!({"call_id": "c3"}));

    let mut request = webhook_request(API_KEY, &signed);
    *request.body_mut() = Body::from(tampered);

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.calls.count_calls().await, 0);
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let app = TestApp::new(StubBackend::new());
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .body(Body::from(event("call_started", json!({"call_id": "c2"}))))
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signed_invalid_json_is_bad_request() {
    let app = TestApp::new(StubBackend::new());
    let (status, json) = app.send(webhook_request(API_KEY, "{\"event\":")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid JSON");
}

#[tokio::test]
async fn test_processing_errors_still_acknowledged() {
    let app = TestApp::new(StubBackend::new());

    // No call_id at all
    let (status, json) = app
        .send(webhook_request(API_KEY, &event("call_started", json!({}))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["received"], true);

    // Ending a call that never started
    let (status, _) = app
        .send(webhook_request(
            API_KEY,
            &event("call_ended", json!({"call_id": "ghost"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Unknown event type
    let (status, _) = app
        .send(webhook_request(
            API_KEY,
            &event("transcript_updated", json!({"call_id": "c1"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.calls.count_calls().await, 0);
}

#[tokio::test]
async fn test_call_analyzed_keeps_state() {
    let app = TestApp::new(StubBackend::new());
    app.call_awaiting_intent("c1").await;

    let (status, _) = app
        .send(webhook_request(
            API_KEY,
            &event("call_analyzed", json!({"call_id": "c1", "summary": "balance inquiry"})),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let call = app.calls.get_call("c1").await.unwrap();
    assert_eq!(call.state, CallState::AwaitingIntent);
    assert!(call.metadata("analyzed_data").is_some());
}

#[tokio::test]
async fn test_get_is_not_allowed() {
    let app = TestApp::new(StubBackend::new());
    let (status, _) = app.get("/webhook").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
