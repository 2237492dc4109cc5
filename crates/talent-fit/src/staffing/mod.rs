//! Staffing workflows: candidate and project embeddings, match suggestions, and
//! event notifications raised by candidate, project, and allocation changes.

pub mod domain;
pub mod embedding;
pub mod matching;
pub mod notifications;
pub mod repository;
pub mod services;

pub use domain::{
    Allocation, AllocationId, Candidate, CandidateId, EmbeddingVector, Project, ProjectId,
    UserSummary,
};
pub use repository::{
    AllocationRepository, CandidateRepository, ProjectDirectory, ProjectRepository,
    RepositoryError,
};
