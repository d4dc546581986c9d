use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tempfile::tempdir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use tungstenite::protocol::Message as WsMessage;

use crate::broker::Broker;
use crate::registry::ConnectionStore;
use crate::transport::gateway::GatewayPush;

fn test_app() -> (tempfile::TempDir, ConnectionStore, Arc<GatewayPush>, Router) {
    let dir = tempdir().unwrap();
    let store = ConnectionStore::open(dir.path().to_str().unwrap()).unwrap();
    let push = Arc::new(GatewayPush::new());
    let broker = Arc::new(Broker::new(
        store.clone(),
        push.clone(),
        Duration::from_millis(100),
        Vec::new(),
    ));
    (dir, store, push, super::router(broker))
}

fn publish_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/publish")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_publish_without_subscribers_returns_empty_summary() {
    let (_dir, _store, _push, app) = test_app();

    let response = app
        .oneshot(publish_request(
            r#"{"subscriptionType":"news","value":{"msg":"hi"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["subscriptionType"], "news");
    assert_eq!(body["resolved"], 0);
    assert_eq!(body["delivered"], 0);
    assert_eq!(body["failed"], 0);
    assert!(body["outcomes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_publish_delivers_to_registered_connection() {
    let (_dir, store, push, app) = test_app();

    store.create_connection("c1", &[]).unwrap();
    store.add_subscription("c1", "news").unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    push.register("c1", tx).await;

    let response = app
        .oneshot(publish_request(
            r#"{"subscriptionType":"news","value":{"msg":"hi"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["resolved"], 1);
    assert_eq!(body["delivered"], 1);
    assert_eq!(body["outcomes"][0]["connectionId"], "c1");
    assert_eq!(body["outcomes"][0]["delivered"], true);

    let WsMessage::Text(text) = rx.try_recv().unwrap() else {
        panic!("expected a text frame");
    };
    let pushed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(pushed["value"]["msg"], "hi");
}

#[tokio::test]
async fn test_publish_reports_failures_in_body_with_status_200() {
    let (_dir, store, _push, app) = test_app();

    // Registered but never connected to the gateway: delivery resolves Gone.
    store.create_connection("stale", &[]).unwrap();
    store.add_subscription("stale", "news").unwrap();

    let response = app
        .oneshot(publish_request(r#"{"subscriptionType":"news","value":{}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["resolved"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["outcomes"][0]["failure"], "gone");

    // The failed Gone delivery self-healed the registry.
    assert!(store.get("stale").unwrap().is_none());
}

#[tokio::test]
async fn test_publish_with_missing_topic_reports_error_in_body() {
    let (_dir, _store, _push, app) = test_app();

    let response = app
        .oneshot(publish_request(r#"{"value":{"msg":"hi"}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("invalid request"));
    assert_eq!(body["resolved"], 0);
}

#[tokio::test]
async fn test_health_reports_connection_count() {
    let (_dir, store, _push, app) = test_app();
    store.create_connection("c1", &[]).unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 1);
}
