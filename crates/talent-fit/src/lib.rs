//! Staffing match and notification engine.
//!
//! Candidates and projects carry embeddings; matching ranks eligible candidates by
//! vector similarity and re-ranks them with a chat-completion pass. State changes in
//! the staffing services fan out to in-app and chat-ops notification channels.

pub mod config;
pub mod error;
pub mod staffing;
pub mod store;
pub mod telemetry;
