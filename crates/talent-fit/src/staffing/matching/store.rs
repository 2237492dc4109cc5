use async_trait::async_trait;
use serde::Serialize;

use super::eligibility::EligibilityStatus;
use crate::staffing::domain::{Candidate, ProjectId};

pub const DEFAULT_SIMILARITY_LIMIT: i64 = 10;

/// Non-positive limits fall back to [`DEFAULT_SIMILARITY_LIMIT`].
pub fn effective_limit(limit: i64) -> i64 {
    if limit <= 0 {
        DEFAULT_SIMILARITY_LIMIT
    } else {
        limit
    }
}

/// One ranked candidate. `similarity` is `1 - cosine distance`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityMatch {
    pub candidate: Candidate,
    pub similarity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EligibilityStatus>,
}

/// Ranks eligible candidates against a project's embedding.
///
/// Both methods return at most `effective_limit(limit)` rows in ascending cosine
/// distance, every row already satisfying the eligibility predicate. The plain
/// variant leaves `candidate.user` empty.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn similar_profiles(
        &self,
        project_id: ProjectId,
        limit: i64,
    ) -> Result<Vec<SimilarityMatch>, VectorStoreError>;

    async fn similar_profiles_with_user(
        &self,
        project_id: ProjectId,
        limit: i64,
    ) -> Result<Vec<SimilarityMatch>, VectorStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    #[error("project {0} has no embedding")]
    ProjectNotEmbedded(ProjectId),
    #[error("ranking query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("vector store unavailable: {0}")]
    Unavailable(String),
}
