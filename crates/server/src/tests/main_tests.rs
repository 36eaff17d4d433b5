use super::*;
use axum::{body, body::Body, http::Request};
use serde_json::{json, Value};
use skill_core::config::TemplateKey;
use tower::ServiceExt;

const BODY_LIMIT: usize = 16 * 1024;

async fn seeded_storage() -> Storage {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.seed_demo_catalog().await.expect("seed");
    storage
}

fn app_with(storage: Storage, skill_config: SkillConfig) -> Router {
    let state = AppState {
        skill: SkillContext::new(Arc::new(storage.clone()), skill_config),
        storage,
    };
    build_router(Arc::new(state), BODY_LIMIT)
}

async fn test_app() -> Router {
    app_with(seeded_storage().await, SkillConfig::default())
}

fn skill_post(payload: &Value) -> Request<Body> {
    Request::post("/skill")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let app = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn launch_without_session_id_is_assigned_one() {
    let app = test_app().await;
    let response = app
        .oneshot(skill_post(&json!({ "request": { "type": "launch" } })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let session_id = body["sessionId"].as_str().expect("session id");
    assert!(Uuid::parse_str(session_id).is_ok());
    assert_eq!(body["version"], SkillConfig::default().version);
    assert_eq!(body["response"]["shouldEndSession"], false);
}

#[tokio::test]
async fn supplied_session_id_is_echoed() {
    let app = test_app().await;
    let response = app
        .oneshot(skill_post(&json!({
            "sessionId": "turn-42",
            "timestamp": "2024-05-01T12:00:00Z",
            "request": { "type": "intent", "name": "GetVersionIntent" },
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["sessionId"], "turn-42");
}

#[tokio::test]
async fn categories_then_next_pages_through_replayed_session() {
    let app = test_app().await;

    let first = app
        .clone()
        .oneshot(skill_post(&json!({
            "sessionId": "browse",
            "request": { "type": "intent", "name": "GetCategoriesIntent" },
        })))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::OK);
    let first = json_body(first).await;
    let text = first["response"]["text"].as_str().expect("text");
    assert!(text.contains("Access Gates"), "{text}");
    assert!(!text.contains("Dishwashers"), "{text}");

    let session = first["response"]["sessionAttributes"].clone();
    assert_eq!(session["querySubject"], "categories");
    assert_eq!(session["startIndex"], 0);

    let second = app
        .oneshot(skill_post(&json!({
            "sessionId": "browse",
            "session": session,
            "request": { "type": "intent", "name": "MoveNextIntent" },
        })))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::OK);
    let second = json_body(second).await;
    let text = second["response"]["text"].as_str().expect("text");
    assert!(text.contains("Dishwashers"), "{text}");
    assert!(!text.contains("Access Gates"), "{text}");
    assert_eq!(second["response"]["sessionAttributes"]["startIndex"], 5);
}

#[tokio::test]
async fn missing_template_is_a_server_error() {
    let mut templates = UiTemplates::default();
    templates.remove_response(TemplateKey::LaunchPrompt);
    let skill_config = SkillConfig {
        templates,
        ..SkillConfig::default()
    };
    let app = app_with(seeded_storage().await, skill_config);

    let response = app
        .oneshot(skill_post(&json!({ "request": { "type": "launch" } })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["code"], "internal");
    assert_eq!(body["message"], "missing response template: launch_prompt");
}

#[tokio::test]
async fn malformed_json_is_rejected_as_validation_error() {
    let app = test_app().await;
    let request = Request::post("/skill")
        .header("content-type", "application/json")
        .body(Body::from("{\"request\": "))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "validation");
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let app = test_app().await;
    let padding = "x".repeat(BODY_LIMIT * 2);
    let payload = json!({
        "request": { "type": "intent", "name": "HelpIntent", "slots": { "noise": padding } },
    })
    .to_string();
    let request = Request::post("/skill")
        .header("content-type", "application/json")
        .header("content-length", payload.len())
        .body(Body::from(payload))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
