use serde::Serialize;
use tracing::{debug, warn};

use super::input::{CandidateEmbeddingInput, ProjectEmbeddingInput};
use super::{EmbeddingError, EmbeddingGateway};
use crate::staffing::domain::{Candidate, EmbeddingVector, Project};

/// Why an embedding is being (re)computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshReason {
    Created,
    Forced,
    Missing,
    DescribingFieldsChanged,
}

/// Entity carrying an embedding derived from some of its own fields.
pub trait Embeddable {
    fn embedding_text(&self) -> String;
    fn embedding(&self) -> Option<&EmbeddingVector>;
    fn set_embedding(&mut self, embedding: Option<EmbeddingVector>);
    fn describing_fields_changed(&self, previous: &Self) -> bool;
}

impl Embeddable for Candidate {
    fn embedding_text(&self) -> String {
        CandidateEmbeddingInput::from(self).to_text()
    }

    fn embedding(&self) -> Option<&EmbeddingVector> {
        self.embedding.as_ref()
    }

    fn set_embedding(&mut self, embedding: Option<EmbeddingVector>) {
        self.embedding = embedding;
    }

    fn describing_fields_changed(&self, previous: &Self) -> bool {
        Candidate::describing_fields_changed(self, previous)
    }
}

impl Embeddable for Project {
    fn embedding_text(&self) -> String {
        ProjectEmbeddingInput::from(self).to_text()
    }

    fn embedding(&self) -> Option<&EmbeddingVector> {
        self.embedding.as_ref()
    }

    fn set_embedding(&mut self, embedding: Option<EmbeddingVector>) {
        self.embedding = embedding;
    }

    fn describing_fields_changed(&self, previous: &Self) -> bool {
        Project::describing_fields_changed(self, previous)
    }
}

/// `previous` is the last persisted state; `None` means the entity is being created.
pub fn refresh_decision<T: Embeddable>(
    previous: Option<&T>,
    current: &T,
    force: bool,
) -> Option<RefreshReason> {
    let Some(previous) = previous else {
        return Some(RefreshReason::Created);
    };
    if force {
        Some(RefreshReason::Forced)
    } else if current.describing_fields_changed(previous) {
        Some(RefreshReason::DescribingFieldsChanged)
    } else if current.embedding().is_none() {
        Some(RefreshReason::Missing)
    } else {
        None
    }
}

/// Applies refresh decisions against the gateway.
#[derive(Clone)]
pub struct EmbeddingLifecycle {
    gateway: EmbeddingGateway,
}

impl EmbeddingLifecycle {
    pub fn new(gateway: EmbeddingGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &EmbeddingGateway {
        &self.gateway
    }

    pub async fn refresh_candidate(
        &self,
        candidate: &mut Candidate,
        previous: Option<&Candidate>,
        force: bool,
    ) -> Result<Option<RefreshReason>, EmbeddingError> {
        self.refresh(candidate, previous, force).await
    }

    pub async fn refresh_project(
        &self,
        project: &mut Project,
        previous: Option<&Project>,
        force: bool,
    ) -> Result<Option<RefreshReason>, EmbeddingError> {
        self.refresh(project, previous, force).await
    }

    /// Embeds every candidate that is missing a vector, or all of them when forced.
    pub async fn refresh_candidates(
        &self,
        candidates: &mut [Candidate],
        force: bool,
    ) -> Result<usize, EmbeddingError> {
        self.refresh_batch(candidates, force).await
    }

    pub async fn refresh_projects(
        &self,
        projects: &mut [Project],
        force: bool,
    ) -> Result<usize, EmbeddingError> {
        self.refresh_batch(projects, force).await
    }

    async fn refresh<T: Embeddable>(
        &self,
        entity: &mut T,
        previous: Option<&T>,
        force: bool,
    ) -> Result<Option<RefreshReason>, EmbeddingError> {
        let Some(reason) = refresh_decision(previous, entity, force) else {
            return Ok(None);
        };

        match self.gateway.embed(&entity.embedding_text()).await {
            Ok(vector) => {
                entity.set_embedding(Some(vector));
                debug!(?reason, "embedding refreshed");
                Ok(Some(reason))
            }
            Err(err) => {
                entity.set_embedding(None);
                Err(err)
            }
        }
    }

    async fn refresh_batch<T: Embeddable>(
        &self,
        entities: &mut [T],
        force: bool,
    ) -> Result<usize, EmbeddingError> {
        let mut targets = Vec::new();
        let mut texts = Vec::new();
        for (position, entity) in entities.iter().enumerate() {
            if !force && entity.embedding().is_some() {
                continue;
            }
            let text = entity.embedding_text();
            if text.is_empty() {
                warn!(position, "skipping entity with no describing text");
                continue;
            }
            targets.push(position);
            texts.push(text);
        }

        if targets.is_empty() {
            return Ok(0);
        }

        let vectors = self.gateway.embed_batch(&texts).await?;
        for (position, vector) in targets.iter().zip(vectors) {
            if let Some(entity) = entities.get_mut(*position) {
                entity.set_embedding(Some(vector));
            }
        }
        Ok(targets.len())
    }
}
