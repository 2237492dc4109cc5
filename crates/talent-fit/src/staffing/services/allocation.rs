use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::StaffingServiceError;
use crate::staffing::domain::{Allocation, AllocationId, CandidateId, ProjectId};
use crate::staffing::notifications::{triggers, NotificationOrchestrator};
use crate::staffing::repository::{
    AllocationRepository, CandidateRepository, ProjectDirectory,
};

pub struct AllocationService<A, C, P> {
    allocations: Arc<A>,
    candidates: Arc<C>,
    projects: Arc<P>,
    notifications: Arc<NotificationOrchestrator>,
}

impl<A, C, P> AllocationService<A, C, P>
where
    A: AllocationRepository + 'static,
    C: CandidateRepository + 'static,
    P: ProjectDirectory + 'static,
{
    pub fn new(
        allocations: Arc<A>,
        candidates: Arc<C>,
        projects: Arc<P>,
        notifications: Arc<NotificationOrchestrator>,
    ) -> Self {
        Self {
            allocations,
            candidates,
            projects,
            notifications,
        }
    }

    /// Stores each allocation and tells the allocated candidate about it.
    pub async fn create(
        &self,
        allocations: Vec<Allocation>,
    ) -> Result<Vec<Allocation>, StaffingServiceError> {
        let mut created = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            created.push(self.insert_and_notify(allocation).await?);
        }
        Ok(created)
    }

    /// Replaces a project's allocation set. Candidates missing from `incoming`
    /// lose their allocation and become open to extra work again; candidates
    /// without a stored allocation get a new one; the rest keep theirs.
    pub async fn update(
        &self,
        project_id: ProjectId,
        incoming: Vec<Allocation>,
    ) -> Result<Vec<Allocation>, StaffingServiceError> {
        let existing = self.allocations.allocations_for_project(project_id).await?;
        let keep: HashSet<CandidateId> = incoming.iter().map(|a| a.candidate_id).collect();

        for removed in existing.iter().filter(|a| !keep.contains(&a.candidate_id)) {
            self.allocations.delete_allocation(removed.id).await?;
            self.release_candidate(removed.candidate_id).await?;
        }

        let mut result = Vec::with_capacity(incoming.len());
        for mut allocation in incoming {
            allocation.project_id = project_id;
            let current = existing
                .iter()
                .find(|stored| stored.candidate_id == allocation.candidate_id);

            match current {
                Some(stored) if allocation.id != AllocationId(0) => result.push(stored.clone()),
                _ => {
                    allocation.id = AllocationId(0);
                    result.push(self.insert_and_notify(allocation).await?);
                }
            }
        }

        info!(%project_id, allocations = result.len(), "project allocations updated");
        Ok(result)
    }

    async fn insert_and_notify(&self, allocation: Allocation) -> Result<Allocation, StaffingServiceError> {
        let stored = self.allocations.insert_allocation(allocation).await?;

        let candidate = self.candidates.candidate(stored.candidate_id).await?;
        let project = self.projects.project(stored.project_id).await?;
        match (candidate, project) {
            (Some(candidate), Some(project)) => {
                self.notifications
                    .dispatch(&triggers::allocation_assigned(&candidate, &project, &stored))
                    .await;
            }
            _ => warn!(
                allocation_id = stored.id.0,
                "allocation stored but candidate or project missing; not notifying"
            ),
        }
        Ok(stored)
    }

    async fn release_candidate(&self, candidate_id: CandidateId) -> Result<(), StaffingServiceError> {
        match self.candidates.candidate(candidate_id).await? {
            Some(mut candidate) if !candidate.open_to_extra_work => {
                candidate.open_to_extra_work = true;
                self.candidates.update_candidate(candidate).await?;
            }
            Some(_) => {}
            None => warn!(%candidate_id, "released candidate not found"),
        }
        Ok(())
    }
}
