use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::service::{MatchError, MatchOrchestrator};
use super::store::VectorStore;
use crate::staffing::repository::ProjectDirectory;

#[derive(Debug, Default, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<i64>,
}

/// Routes exposing match suggestions and the raw similarity ranking.
pub fn match_router<P, V>(orchestrator: Arc<MatchOrchestrator<P, V>>) -> Router
where
    P: ProjectDirectory + 'static,
    V: VectorStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/projects/:project_id/matches",
            get(suggestions_handler::<P, V>),
        )
        .route(
            "/api/v1/projects/:project_id/similar-candidates",
            get(similar_handler::<P, V>),
        )
        .with_state(orchestrator)
}

pub(crate) async fn suggestions_handler<P, V>(
    State(orchestrator): State<Arc<MatchOrchestrator<P, V>>>,
    Path(project_id): Path<String>,
) -> Response
where
    P: ProjectDirectory + 'static,
    V: VectorStore + 'static,
{
    match orchestrator.generate_match_suggestions(&project_id).await {
        Ok(suggestions) => (StatusCode::OK, axum::Json(suggestions)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn similar_handler<P, V>(
    State(orchestrator): State<Arc<MatchOrchestrator<P, V>>>,
    Path(project_id): Path<String>,
    Query(query): Query<SimilarQuery>,
) -> Response
where
    P: ProjectDirectory + 'static,
    V: VectorStore + 'static,
{
    let limit = query.limit.unwrap_or(0);
    match orchestrator.similar_candidates(&project_id, limit).await {
        Ok(matches) => (StatusCode::OK, axum::Json(matches)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: MatchError) -> Response {
    let status = error.status_code();
    if status.is_server_error() {
        warn!(%error, "match request failed");
    }
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
