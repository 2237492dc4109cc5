use async_trait::async_trait;

use super::domain::{Allocation, AllocationId, Candidate, CandidateId, Project, ProjectId};

/// Read access to projects; all the matching path needs.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn project(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError>;
}

#[async_trait]
pub trait ProjectRepository: ProjectDirectory {
    async fn insert_project(&self, project: Project) -> Result<Project, RepositoryError>;
    async fn update_project(&self, project: Project) -> Result<(), RepositoryError>;
    async fn list_projects(&self) -> Result<Vec<Project>, RepositoryError>;
}

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    async fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError>;
    async fn update_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError>;
    async fn list_candidates(&self) -> Result<Vec<Candidate>, RepositoryError>;
}

#[async_trait]
pub trait AllocationRepository: Send + Sync {
    async fn insert_allocation(&self, allocation: Allocation) -> Result<Allocation, RepositoryError>;
    async fn delete_allocation(&self, id: AllocationId) -> Result<(), RepositoryError>;
    async fn allocations_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Allocation>, RepositoryError>;
    async fn allocations_for_candidate(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Vec<Allocation>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(err) if err.is_unique_violation() => RepositoryError::Conflict,
            other => RepositoryError::Unavailable(other.to_string()),
        }
    }
}
