//! Embedding and chat-completion gateway.
//!
//! Two providers sit behind the gateway: one returns dense vectors, the other answers
//! chat prompts (project summaries and match scoring). Inputs are normalized before
//! they leave the process and vector dimensionality is checked on the way back.

pub mod input;
pub mod lifecycle;
pub mod openai;
pub mod prompt;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::domain::EmbeddingVector;

pub use input::{normalize_text, CandidateEmbeddingInput, ProjectEmbeddingInput};
pub use lifecycle::{refresh_decision, EmbeddingLifecycle, RefreshReason};
pub use openai::{OpenAiChat, OpenAiEmbeddings};

/// One vector returned by the provider, tagged with the position of its input.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEmbedding {
    pub index: usize,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub user: String,
}

/// Vector embedding backend.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<IndexedEmbedding>, ProviderError>;
}

/// Chat-completion backend. Returns the content of every choice, in order.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<Vec<String>, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider is not configured: {0}")]
    Unconfigured(&'static str),
    #[error("provider request failed: {0}")]
    Request(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("input text is empty after normalization")]
    EmptyInput,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("provider returned {actual} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
    #[error("provider returned {actual}-dimension vector, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("summarization failed: {0}")]
    Summarization(String),
}

/// Front door for everything that talks to a model provider.
#[derive(Clone)]
pub struct EmbeddingGateway {
    embeddings: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatProvider>,
    dimensions: usize,
}

impl EmbeddingGateway {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
        dimensions: usize,
    ) -> Self {
        Self {
            embeddings,
            chat,
            dimensions,
        }
    }

    #[tracing::instrument(skip_all, fields(chars = text.len()))]
    pub async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError> {
        let cleaned = normalize_text(text);
        if cleaned.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut vectors = self.embeddings.embed(vec![cleaned]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: vectors.len(),
            });
        }

        let vector = vectors.remove(0);
        self.check_dimensions(vector.values)
    }

    /// Embeds every non-blank input. Blank entries are dropped before the call, so
    /// the result lines up with the filtered list, not the argument.
    #[tracing::instrument(skip_all, fields(inputs = texts.len()))]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        let cleaned: Vec<String> = texts
            .iter()
            .map(|text| normalize_text(text))
            .filter(|text| !text.is_empty())
            .collect();
        if cleaned.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let expected = cleaned.len();
        let mut vectors = self.embeddings.embed(cleaned).await?;
        if vectors.len() != expected {
            return Err(EmbeddingError::CountMismatch {
                expected,
                actual: vectors.len(),
            });
        }

        vectors.sort_by_key(|vector| vector.index);
        debug!(count = expected, "batch embeddings received");
        vectors
            .into_iter()
            .map(|vector| self.check_dimensions(vector.values))
            .collect()
    }

    /// Asks the chat model for a structured requirements summary of a project.
    #[tracing::instrument(skip_all)]
    pub async fn summarize(
        &self,
        description: &str,
        seats_by_role: &BTreeMap<String, u32>,
    ) -> Result<String, EmbeddingError> {
        let request = ChatRequest {
            system: Some(prompt::SUMMARY_SYSTEM_PROMPT.to_string()),
            user: prompt::summary_prompt(description, seats_by_role),
        };

        let choices = self
            .chat
            .complete(request)
            .await
            .map_err(|err| EmbeddingError::Summarization(err.to_string()))?;

        choices
            .into_iter()
            .next()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| EmbeddingError::Summarization("no summary returned".to_string()))
    }

    /// Raw chat completion; returns the content of every choice.
    pub async fn chat(&self, system: Option<&str>, user: &str) -> Result<Vec<String>, ProviderError> {
        self.chat
            .complete(ChatRequest {
                system: system.map(str::to_string),
                user: user.to_string(),
            })
            .await
    }

    fn check_dimensions(&self, values: Vec<f32>) -> Result<EmbeddingVector, EmbeddingError> {
        if values.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: values.len(),
            });
        }
        Ok(EmbeddingVector::new(values))
    }
}
