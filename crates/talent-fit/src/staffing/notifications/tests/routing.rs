use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use super::common::*;
use crate::staffing::notifications::{dev_notification_router, NotificationOrchestrator, Notifier};

fn post() -> Request<Body> {
    Request::post("/api/v1/dev/notifications/test")
        .body(Body::empty())
        .expect("request builds")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn production_refuses_test_notifications() {
    let channel = Arc::new(RecordingNotifier::ok("in-app"));
    let orchestrator = Arc::new(NotificationOrchestrator::new(vec![
        channel.clone() as Arc<dyn Notifier>
    ]));

    let response = dev_notification_router(orchestrator, true)
        .oneshot(post())
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "disabled in production");
    assert_eq!(channel.sent(), 0);
}

#[tokio::test]
async fn development_dispatches_and_reports() {
    let orchestrator = Arc::new(NotificationOrchestrator::new(vec![
        Arc::new(RecordingNotifier::ok("in-app")) as Arc<dyn Notifier>,
        Arc::new(RecordingNotifier::failing("chat-ops")) as Arc<dyn Notifier>,
    ]));

    let response = dev_notification_router(orchestrator, false)
        .oneshot(post())
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["delivered"][0], "in-app");
    assert_eq!(body["failed"][0]["channel"], "chat-ops");
}
