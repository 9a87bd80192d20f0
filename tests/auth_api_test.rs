//! Auth endpoint integration tests

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{StubBackend, TestApp};
use serde_json::json;
use voicebank::domain::user::{Session, UserRepository};

async fn register(app: &TestApp) -> String {
    let (status, json) = app
        .post(
            "/auth/register",
            json!({
                "phone": "+14155550100",
                "pin": "4321",
                "name": "Dana Lee",
                "email": "dana@example.com"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    json["user"]["user_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_seeds_accounts_and_hides_secrets() {
    let app = TestApp::new(StubBackend::new());
    let (status, json) = app
        .post(
            "/auth/register",
            json!({"phone": "+14155550100", "pin": "4321", "name": "Dana Lee"}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(json["user"].get("pin").is_none());
    assert!(json["user"].get("ssn").is_none());
    assert!(json["accounts"].as_array().unwrap().len() >= 2);

    let (status, _) = app
        .post(
            "/auth/register",
            json!({"phone": "+14155550100", "pin": "0000", "name": "Someone Else"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_validate_logout() {
    let app = TestApp::new(StubBackend::new());
    let user_id = register(&app).await;

    let (status, json) = app
        .post("/auth/login", json!({"phone": "+14155550100", "pin": "4321"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["user_id"], user_id.as_str());
    let token = json["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);

    let (status, json) = app.post("/auth/validate", json!({"token": token})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], true);
    assert_eq!(json["user_id"], user_id.as_str());

    let (status, _) = app.post("/auth/logout", json!({"token": token})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post("/auth/validate", json!({"token": token})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let app = TestApp::new(StubBackend::new());

    for uri in ["/auth/validate", "/auth/logout"] {
        let (status, json) = app.post(uri, json!({"token": "never-issued"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(json["status"], 401);
        assert!(json["error"].as_str().unwrap().contains("token not found"));
    }
}

#[tokio::test]
async fn test_wrong_pin_is_unauthorized() {
    let app = TestApp::new(StubBackend::new());
    register(&app).await;

    let (status, json) = app
        .post("/auth/login", json!({"phone": "+14155550100", "pin": "9999"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["status"], 401);
}

#[tokio::test]
async fn test_expired_token_is_rejected_and_removed() {
    let app = TestApp::new(StubBackend::new());
    let user_id = register(&app).await;

    let now = Utc::now().timestamp();
    app.users
        .create_session(&Session {
            token: "stale-token".into(),
            user_id,
            created_at: now - 86_401,
            expires_at: now - 1,
        })
        .await
        .unwrap();

    let (status, json) = app
        .post("/auth/validate", json!({"token": "stale-token"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].as_str().unwrap().contains("token expired"));

    assert!(app.users.find_session("stale-token").await.unwrap().is_none());
    let (status, _) = app
        .post("/auth/validate", json!({"token": "stale-token"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_requires_fields() {
    let app = TestApp::new(StubBackend::new());
    let (status, json) = app.post("/auth/login", json!({"phone": ""})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"]["phone"], "is required");
    assert_eq!(json["details"]["pin"], "is required");
}
