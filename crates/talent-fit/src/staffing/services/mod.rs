//! Candidate, project, and allocation services.
//!
//! Writes keep embeddings current and raise notification triggers on state
//! transitions. Embedding failures never fail a write; they are logged and the
//! stale vector is dropped so the entity is re-embedded later.

mod allocation;
mod candidate;
mod project;

#[cfg(test)]
mod tests;

pub use allocation::AllocationService;
pub use candidate::CandidateService;
pub use project::ProjectService;

use crate::staffing::embedding::EmbeddingError;
use crate::staffing::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum StaffingServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
