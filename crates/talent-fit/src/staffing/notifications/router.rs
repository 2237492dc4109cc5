use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::orchestrator::NotificationOrchestrator;
use super::triggers::test_notification;

#[derive(Clone)]
pub struct DevNotificationState {
    pub orchestrator: Arc<NotificationOrchestrator>,
    pub production: bool,
}

/// Development-only trigger for the canned test message.
pub fn dev_notification_router(orchestrator: Arc<NotificationOrchestrator>, production: bool) -> Router {
    Router::new()
        .route("/api/v1/dev/notifications/test", post(test_notification_handler))
        .with_state(DevNotificationState {
            orchestrator,
            production,
        })
}

pub(crate) async fn test_notification_handler(State(state): State<DevNotificationState>) -> Response {
    if state.production {
        let payload = json!({ "error": "disabled in production" });
        return (StatusCode::FORBIDDEN, axum::Json(payload)).into_response();
    }

    let report = state.orchestrator.dispatch(&test_notification()).await;
    let payload = json!({
        "ok": true,
        "delivered": report.delivered,
        "failed": report.failed,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}
