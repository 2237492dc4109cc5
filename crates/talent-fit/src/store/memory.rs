use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::staffing::domain::{Allocation, AllocationId, Candidate, CandidateId, Project, ProjectId};
use crate::staffing::matching::{classify, effective_limit, SimilarityMatch, VectorStore, VectorStoreError};
use crate::staffing::notifications::{InAppNotification, NewInAppNotification, NotificationStore};
use crate::staffing::repository::{
    AllocationRepository, CandidateRepository, ProjectDirectory, ProjectRepository,
    RepositoryError,
};

#[derive(Default)]
struct State {
    candidates: BTreeMap<CandidateId, Candidate>,
    projects: BTreeMap<ProjectId, Project>,
    allocations: BTreeMap<AllocationId, Allocation>,
    notifications: Vec<InAppNotification>,
    next_allocation_id: i64,
}

/// Process-local store backing every staffing trait. Used for tests and for
/// running without a database.
#[derive(Default)]
pub struct InMemoryStaffingStore {
    state: RwLock<State>,
}

impl InMemoryStaffingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, RepositoryError> {
        self.state
            .read()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, RepositoryError> {
        self.state
            .write()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }

    /// Every in-app notification written so far, oldest first.
    pub fn notifications(&self) -> Result<Vec<InAppNotification>, RepositoryError> {
        Ok(self.read()?.notifications.clone())
    }

    fn rank(
        &self,
        project_id: ProjectId,
        limit: i64,
        with_user: bool,
    ) -> Result<Vec<SimilarityMatch>, VectorStoreError> {
        let state = self
            .read()
            .map_err(|err| VectorStoreError::Unavailable(err.to_string()))?;

        let project = state
            .projects
            .get(&project_id)
            .ok_or(VectorStoreError::ProjectNotFound(project_id))?;
        let target = project
            .embedding
            .as_ref()
            .ok_or(VectorStoreError::ProjectNotEmbedded(project_id))?;
        let starts_on = project
            .start_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let allocations: Vec<Allocation> = state.allocations.values().cloned().collect();

        let mut ranked: Vec<SimilarityMatch> = state
            .candidates
            .values()
            .filter_map(|candidate| {
                let embedding = candidate.embedding.as_ref()?;
                let status = classify(candidate, &allocations, project_id, starts_on)?;
                let mut candidate = candidate.clone();
                if !with_user {
                    candidate.user = None;
                }
                Some(SimilarityMatch {
                    similarity: embedding.cosine_similarity(target),
                    candidate,
                    status: Some(status),
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        ranked.truncate(usize::try_from(effective_limit(limit)).unwrap_or(usize::MAX));
        Ok(ranked)
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryStaffingStore {
    async fn project(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(self.read()?.projects.get(&id).cloned())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStaffingStore {
    async fn insert_project(&self, project: Project) -> Result<Project, RepositoryError> {
        let mut state = self.write()?;
        if state.projects.contains_key(&project.id) {
            return Err(RepositoryError::Conflict);
        }
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update_project(&self, project: Project) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        match state.projects.get_mut(&project.id) {
            Some(slot) => {
                *slot = project;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        Ok(self.read()?.projects.values().cloned().collect())
    }
}

#[async_trait]
impl CandidateRepository for InMemoryStaffingStore {
    async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Ok(self.read()?.candidates.get(&id).cloned())
    }

    async fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let mut state = self.write()?;
        if state.candidates.contains_key(&candidate.id) {
            return Err(RepositoryError::Conflict);
        }
        state.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn update_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        match state.candidates.get_mut(&candidate.id) {
            Some(slot) => {
                *slot = candidate;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, RepositoryError> {
        Ok(self.read()?.candidates.values().cloned().collect())
    }
}

#[async_trait]
impl AllocationRepository for InMemoryStaffingStore {
    /// An id of 0 asks the store to assign one.
    async fn insert_allocation(&self, mut allocation: Allocation) -> Result<Allocation, RepositoryError> {
        let mut state = self.write()?;
        if allocation.id == AllocationId(0) {
            state.next_allocation_id += 1;
            allocation.id = AllocationId(state.next_allocation_id);
        } else if state.allocations.contains_key(&allocation.id) {
            return Err(RepositoryError::Conflict);
        } else {
            state.next_allocation_id = state.next_allocation_id.max(allocation.id.0);
        }
        state.allocations.insert(allocation.id, allocation.clone());
        Ok(allocation)
    }

    async fn delete_allocation(&self, id: AllocationId) -> Result<(), RepositoryError> {
        self.write()?
            .allocations
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn allocations_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Allocation>, RepositoryError> {
        Ok(self
            .read()?
            .allocations
            .values()
            .filter(|allocation| allocation.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn allocations_for_candidate(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Vec<Allocation>, RepositoryError> {
        Ok(self
            .read()?
            .allocations
            .values()
            .filter(|allocation| allocation.candidate_id == candidate_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for InMemoryStaffingStore {
    async fn insert_notification(
        &self,
        notification: NewInAppNotification,
    ) -> Result<InAppNotification, RepositoryError> {
        let mut state = self.write()?;
        let row = InAppNotification {
            id: state.notifications.len() as i64 + 1,
            user_id: notification.user_id,
            kind: notification.kind,
            message: notification.message,
            is_read: false,
            created_at: Utc::now(),
        };
        state.notifications.push(row.clone());
        Ok(row)
    }

    async fn notifications_for_user(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<InAppNotification>, RepositoryError> {
        Ok(self
            .read()?
            .notifications
            .iter()
            .rev()
            .filter(|row| row.user_id == user_id && (!unread_only || !row.is_read))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VectorStore for InMemoryStaffingStore {
    async fn similar_profiles(
        &self,
        project_id: ProjectId,
        limit: i64,
    ) -> Result<Vec<SimilarityMatch>, VectorStoreError> {
        self.rank(project_id, limit, false)
    }

    async fn similar_profiles_with_user(
        &self,
        project_id: ProjectId,
        limit: i64,
    ) -> Result<Vec<SimilarityMatch>, VectorStoreError> {
        self.rank(project_id, limit, true)
    }
}
