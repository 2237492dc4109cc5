use std::sync::Arc;

use tracing::{info, warn};

use super::StaffingServiceError;
use crate::staffing::domain::{Candidate, CandidateId};
use crate::staffing::embedding::{EmbeddingLifecycle, RefreshReason};
use crate::staffing::notifications::{triggers, NotificationOrchestrator};
use crate::staffing::repository::{CandidateRepository, RepositoryError};

pub struct CandidateService<R> {
    candidates: Arc<R>,
    lifecycle: EmbeddingLifecycle,
    notifications: Arc<NotificationOrchestrator>,
}

impl<R> CandidateService<R>
where
    R: CandidateRepository + 'static,
{
    pub fn new(
        candidates: Arc<R>,
        lifecycle: EmbeddingLifecycle,
        notifications: Arc<NotificationOrchestrator>,
    ) -> Self {
        Self {
            candidates,
            lifecycle,
            notifications,
        }
    }

    pub async fn create(&self, mut candidate: Candidate) -> Result<Candidate, StaffingServiceError> {
        if let Err(error) = self.lifecycle.refresh_candidate(&mut candidate, None, false).await {
            warn!(candidate_id = %candidate.id, %error, "candidate embedding failed on create");
        }
        Ok(self.candidates.insert_candidate(candidate).await?)
    }

    /// Persists the new state; re-embeds only when describing fields changed and
    /// raises a rolloff alert when the end date goes from unset to set.
    pub async fn update(&self, mut candidate: Candidate) -> Result<Candidate, StaffingServiceError> {
        let existing = self
            .candidates
            .candidate(candidate.id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if candidate.embedding.is_none() {
            candidate.embedding = existing.embedding.clone();
        }
        if let Err(error) = self
            .lifecycle
            .refresh_candidate(&mut candidate, Some(&existing), false)
            .await
        {
            warn!(candidate_id = %candidate.id, %error, "candidate embedding refresh failed");
        }

        self.candidates.update_candidate(candidate.clone()).await?;

        if let (None, Some(end_date)) = (existing.end_date, candidate.end_date) {
            info!(candidate_id = %candidate.id, %end_date, "candidate rolling off");
            self.notifications
                .dispatch(&triggers::rolloff_alert(&candidate, end_date))
                .await;
        }
        Ok(candidate)
    }

    /// Explicit refresh; unlike writes, provider failures are returned.
    pub async fn refresh_embedding(
        &self,
        id: CandidateId,
        force: bool,
    ) -> Result<Option<RefreshReason>, StaffingServiceError> {
        let mut candidate = self
            .candidates
            .candidate(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let snapshot = candidate.clone();

        let outcome = self
            .lifecycle
            .refresh_candidate(&mut candidate, Some(&snapshot), force)
            .await;
        if candidate.embedding != snapshot.embedding {
            self.candidates.update_candidate(candidate).await?;
        }
        Ok(outcome?)
    }

    /// Embeds every candidate lacking a vector, or all of them when forced.
    pub async fn refresh_all(&self, force: bool) -> Result<usize, StaffingServiceError> {
        let mut candidates = self.candidates.list_candidates().await?;
        let refreshed = self.lifecycle.refresh_candidates(&mut candidates, force).await?;
        if refreshed > 0 {
            for candidate in candidates {
                self.candidates.update_candidate(candidate).await?;
            }
        }
        info!(refreshed, "candidate embeddings refreshed");
        Ok(refreshed)
    }
}
