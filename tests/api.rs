//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt;

use fable_gateway::api::ApiState;
use fable_gateway::chat::ChatProvider;
use fable_gateway::session::GameSession;

mod common;
use common::{FailingChat, ScriptedChat, test_scenario};

/// Build a test API router over the given chat backend
fn build_test_router(chat: Arc<dyn ChatProvider>) -> axum::Router {
    let state = Arc::new(ApiState {
        session: Mutex::new(GameSession::new(test_scenario(), chat)),
        images: None,
        speaker: None,
        chat_backend: "scripted",
        image_backend: None,
    });

    axum::Router::new()
        .merge(fable_gateway::api::health::router())
        .merge(fable_gateway::api::health::status_router(state.clone()))
        .merge(fable_gateway::api::game::router(state))
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(ScriptedChat::new(&[]));

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_status_reports_configured_backends() {
    let app = build_test_router(ScriptedChat::new(&[]));

    let response = app.oneshot(get_request("/api/status")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["scenario"], "test-dungeon");
    assert_eq!(body["chat_backend"], "scripted");
    // No image backend configured, so the field is omitted entirely.
    assert!(body.get("image_backend").is_none());
    assert_eq!(body["voice_available"], false);
    assert_eq!(body["turns"], 1);

    let session_id = body["session_id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(session_id).is_ok());
}

#[tokio::test]
async fn test_scenario_endpoint() {
    let app = build_test_router(ScriptedChat::new(&[]));

    let response = app.oneshot(get_request("/api/scenario")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["id"], "test-dungeon");
    assert_eq!(body["name"], "Test Dungeon");
    assert_eq!(body["labels"]["narrator"], "Game Master");
    assert_eq!(body["labels"]["player"], "Player");
}

#[tokio::test]
async fn test_chat_plays_one_turn() {
    let chat = ScriptedChat::new(&["You step inside.\n\n1. Light a torch\n2. Feel your way"]);
    let app = build_test_router(chat.clone());

    let response = app
        .clone()
        .oneshot(post_json("/api/chat", &json!({ "message": "Enter" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["reply"], "You step inside.\n\n1. Light a torch\n2. Feel your way");
    assert_eq!(body["options"], json!(["Light a torch", "Feel your way"]));
    assert_eq!(chat.calls(), 1);

    let response = app.oneshot(get_request("/api/conversation")).await.unwrap();
    let turns = read_json(response).await;
    assert_eq!(turns.as_array().unwrap().len(), 3);
    assert_eq!(turns[1]["speaker"], "user");
    assert_eq!(turns[1]["text"], "Enter");
}

#[tokio::test]
async fn test_chat_selected_option_wins_over_message() {
    let chat = ScriptedChat::new(&["The torch sputters to life."]);
    let app = build_test_router(chat);

    let request = post_json(
        "/api/chat",
        &json!({ "message": "typed text", "option": "Light a torch" }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The chosen option, not the typed text, becomes the player turn.
    let response = app.oneshot(get_request("/api/conversation")).await.unwrap();
    let turns = read_json(response).await;
    assert_eq!(turns[1]["text"], "Light a torch");
}

#[tokio::test]
async fn test_chat_empty_body_is_bad_request() {
    let chat = ScriptedChat::new(&["unused"]);
    let app = build_test_router(chat.clone());

    let response = app
        .oneshot(post_json("/api/chat", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(chat.calls(), 0);
}

#[tokio::test]
async fn test_chat_backend_failure_is_bad_gateway() {
    let app = build_test_router(Arc::new(FailingChat));

    let response = app
        .oneshot(post_json("/api/chat", &json!({ "message": "Enter" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "chat_failed");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("backend unavailable")
    );
}

#[tokio::test]
async fn test_restart_resets_history() {
    let chat = ScriptedChat::new(&["You step inside."]);
    let app = build_test_router(chat);

    let response = app
        .clone()
        .oneshot(post_json("/api/chat", &json!({ "message": "Enter" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json("/api/restart", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["opening"], "You stand at the dungeon gate.");

    let response = app.oneshot(get_request("/api/status")).await.unwrap();
    let status = read_json(response).await;
    assert_eq!(status["turns"], 1);
}

#[tokio::test]
async fn test_transcript_is_plain_text() {
    let app = build_test_router(ScriptedChat::new(&[]));

    let response = app.oneshot(get_request("/api/transcript")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text, "Game Master: You stand at the dungeon gate.");
}

#[tokio::test]
async fn test_speak_without_voice_is_unavailable() {
    let app = build_test_router(ScriptedChat::new(&[]));

    let response = app
        .oneshot(post_json("/api/speak", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "not_configured");
}

#[tokio::test]
async fn test_image_without_backend_is_unavailable() {
    let app = build_test_router(ScriptedChat::new(&[]));

    let response = app
        .oneshot(post_json("/api/image", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "not_configured");
}
