use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use tracing::info;

use super::scoring::{CandidateScore, ScoringEngine, ScoringError};
use super::store::{SimilarityMatch, VectorStore, VectorStoreError};
use crate::staffing::domain::{Candidate, CandidateId, ProjectId};
use crate::staffing::repository::{ProjectDirectory, RepositoryError};

/// Candidates fetched for the scoring pass.
pub const SUGGESTION_POOL_SIZE: i64 = 20;

/// Scored candidate joined with the full profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSuggestion {
    #[serde(flatten)]
    pub score: CandidateScore,
    pub profile: Candidate,
}

/// Similarity retrieval followed by a chat-model scoring pass.
pub struct MatchOrchestrator<P, V> {
    projects: Arc<P>,
    store: Arc<V>,
    scoring: Arc<ScoringEngine>,
}

impl<P, V> MatchOrchestrator<P, V>
where
    P: ProjectDirectory + 'static,
    V: VectorStore + 'static,
{
    pub fn new(projects: Arc<P>, store: Arc<V>, scoring: Arc<ScoringEngine>) -> Self {
        Self {
            projects,
            store,
            scoring,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn generate_match_suggestions(
        &self,
        project_id: &str,
    ) -> Result<Vec<MatchSuggestion>, MatchError> {
        let project_id = parse_project_id(project_id)?;
        let project = self
            .projects
            .project(project_id)
            .await?
            .ok_or(MatchError::ProjectNotFound(project_id))?;

        let candidates = self
            .store
            .similar_profiles_with_user(project_id, SUGGESTION_POOL_SIZE)
            .await?;
        if candidates.is_empty() {
            info!(%project_id, "no eligible candidates");
            return Ok(Vec::new());
        }

        let prompt = self.scoring.build_prompt(&project.summary, &candidates);
        let raw = self.scoring.score(&prompt).await?;
        let scores = self.scoring.parse(&raw)?;

        let mut by_id: HashMap<CandidateId, Candidate> = candidates
            .into_iter()
            .map(|entry| (entry.candidate.id, entry.candidate))
            .collect();

        let suggestions: Vec<MatchSuggestion> = scores
            .into_iter()
            .filter_map(|score| {
                by_id.remove(&score.candidate_id).map(|profile| MatchSuggestion { score, profile })
            })
            .collect();

        info!(%project_id, suggestions = suggestions.len(), "match suggestions generated");
        Ok(suggestions)
    }

    /// Raw ranked list with user fields, without the scoring pass.
    pub async fn similar_candidates(
        &self,
        project_id: &str,
        limit: i64,
    ) -> Result<Vec<SimilarityMatch>, MatchError> {
        let project_id = parse_project_id(project_id)?;
        Ok(self.store.similar_profiles_with_user(project_id, limit).await?)
    }
}

fn parse_project_id(raw: &str) -> Result<ProjectId, MatchError> {
    raw.parse::<ProjectId>()
        .map_err(|_| MatchError::InvalidProjectId(raw.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("invalid project id '{0}'")]
    InvalidProjectId(String),
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    #[error("project {0} has no embedding yet")]
    ProjectNotEmbedded(ProjectId),
    #[error(transparent)]
    Store(VectorStoreError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl MatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MatchError::InvalidProjectId(_) => StatusCode::BAD_REQUEST,
            MatchError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            MatchError::ProjectNotEmbedded(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MatchError::Scoring(_) => StatusCode::BAD_GATEWAY,
            MatchError::Store(_) | MatchError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<VectorStoreError> for MatchError {
    fn from(value: VectorStoreError) -> Self {
        match value {
            VectorStoreError::ProjectNotFound(id) => MatchError::ProjectNotFound(id),
            VectorStoreError::ProjectNotEmbedded(id) => MatchError::ProjectNotEmbedded(id),
            other => MatchError::Store(other),
        }
    }
}
