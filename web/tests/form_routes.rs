//! Integration tests for action routes
//!
//! Drives a `Router` with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use axum::body::{to_bytes, Body};
use axum::routing::get;
use axum::Router;
use form_action_core::prelude::*;
use form_action_runtime::ActionStore;
use form_action_testing::init_test_tracing;
use form_action_web::handlers::{dispatch_route, submit_route, view_handler};
use form_action_web::{state_header, TAG_HEADER};
use http::{header::CONTENT_TYPE, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// Test Fixtures
// ============================================================================

fn subscribe() -> FormAction<Value, String> {
    form_action()
        .input(schema::object().field("email", schema::email()))
        .error(|error, _ctx| error.to_string())
        .run(|call: ActionCall<Value>| async move {
            if call.input["email"] == "taken@example.com" {
                anyhow::bail!("Already subscribed!");
            }
            anyhow::Ok(json!({ "subscribed": call.input["email"] }))
        })
}

fn app() -> Router {
    Router::new().route("/subscribe", submit_route(subscribe(), Value::Null))
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Stateless submission
// ============================================================================

#[tokio::test]
async fn valid_submission_returns_success() {
    init_test_tracing();
    let response = app()
        .oneshot(form_post("/subscribe", "email=ann%40example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[&TAG_HEADER], "success");
    assert_eq!(
        json_body(response).await,
        json!({
            "tag": "success",
            "data": { "subscribed": "ann@example.com" },
            "error": null,
            "validationError": null
        })
    );
}

#[tokio::test]
async fn invalid_submission_returns_422_with_field_errors() {
    let response = app()
        .oneshot(form_post("/subscribe", "email=nope"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["tag"], "invalid");
    assert_eq!(body["validationError"]["properties"]["email"]["errors"], json!(["Invalid email"]));
}

#[tokio::test]
async fn transformed_failure_is_a_normal_response() {
    let response = app()
        .oneshot(form_post("/subscribe", "email=taken%40example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["tag"], "failure");
    assert_eq!(body["error"], "Already subscribed!");
}

#[tokio::test]
async fn previous_state_reaches_the_handler() {
    let echo_previous = FormAction::new(|submission: Submission<u32, String>| async move {
        let seen = submission.previous_state.data().copied().unwrap_or_default();
        anyhow::Ok(SubmissionState::success(seen + 1))
    });
    let app: Router = Router::new().route("/count", submit_route(echo_previous, 0));

    let (name, value) = state_header(&SubmissionState::<u32, String>::success(41)).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/count")
        .header(name, value)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(json_body(response).await["data"], 42);
}

#[tokio::test]
async fn malformed_previous_state_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/subscribe")
        .header("x-form-action-state", "{not json")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn json_body_is_415() {
    let request = Request::builder()
        .method("POST")
        .uri("/subscribe")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"a@b.cz"}"#))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn middleware_failure_is_500_without_details() {
    let action = form_action()
        .middleware(|_: Context| async { Err::<Value, _>(anyhow::anyhow!("session store offline")) })
        .error(|error, _ctx| error.to_string())
        .run(|_: ActionCall| async { anyhow::Ok(()) });
    let app: Router = Router::new().route("/guarded", submit_route(action, ()));

    let response = app.oneshot(form_post("/guarded", "")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    assert!(!body["message"].as_str().unwrap().contains("offline"));
}

// ============================================================================
// Store-backed submission
// ============================================================================

#[tokio::test]
async fn store_routes_share_state() {
    let store = ActionStore::new(subscribe(), Value::Null);
    let app = Router::new()
        .route("/subscribe", dispatch_route(store.clone()).get(view_handler::<Value, String>))
        .with_state(store);

    let response = app
        .clone()
        .oneshot(Request::get("/subscribe").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["isInitial"], true);
    assert_eq!(body["isPending"], false);

    let response = app
        .clone()
        .oneshot(form_post("/subscribe", "email=bob%40example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/subscribe").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["isSuccess"], true);
    assert_eq!(body["data"], json!({ "subscribed": "bob@example.com" }));
}

#[tokio::test]
async fn health_route() {
    let app: Router = Router::new().route("/health", get(form_action_web::handlers::health_check));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
