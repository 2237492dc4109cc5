//! Candidate matching: eligibility, similarity retrieval, and chat-model scoring.

pub mod eligibility;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use eligibility::{classify, rolloff_window, EligibilityStatus, ROLLOFF_GRACE_DAYS};
pub use router::match_router;
pub use scoring::{CandidateScore, ScoringEngine, ScoringError, ScoringRules};
pub use service::{MatchError, MatchOrchestrator, MatchSuggestion, SUGGESTION_POOL_SIZE};
pub use store::{effective_limit, SimilarityMatch, VectorStore, VectorStoreError};
