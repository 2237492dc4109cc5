use std::sync::Arc;

use tracing::{info, warn};

use super::StaffingServiceError;
use crate::staffing::domain::{Candidate, Project, ProjectId};
use crate::staffing::embedding::{EmbeddingLifecycle, RefreshReason};
use crate::staffing::notifications::{triggers, NotificationOrchestrator};
use crate::staffing::repository::{
    AllocationRepository, CandidateRepository, ProjectRepository, RepositoryError,
};

pub struct ProjectService<R, A, C> {
    projects: Arc<R>,
    allocations: Arc<A>,
    candidates: Arc<C>,
    lifecycle: EmbeddingLifecycle,
    notifications: Arc<NotificationOrchestrator>,
}

impl<R, A, C> ProjectService<R, A, C>
where
    R: ProjectRepository + 'static,
    A: AllocationRepository + 'static,
    C: CandidateRepository + 'static,
{
    pub fn new(
        projects: Arc<R>,
        allocations: Arc<A>,
        candidates: Arc<C>,
        lifecycle: EmbeddingLifecycle,
        notifications: Arc<NotificationOrchestrator>,
    ) -> Self {
        Self {
            projects,
            allocations,
            candidates,
            lifecycle,
            notifications,
        }
    }

    pub async fn create(&self, mut project: Project) -> Result<Project, StaffingServiceError> {
        self.summarize(&mut project).await;
        if let Err(error) = self.lifecycle.refresh_project(&mut project, None, false).await {
            warn!(project_id = %project.id, %error, "project embedding failed on create");
        }
        Ok(self.projects.insert_project(project).await?)
    }

    /// Re-summarizes and re-embeds when the description or seats change, and
    /// notifies allocated candidates when the end date moves to a new value.
    pub async fn update(&self, mut project: Project) -> Result<Project, StaffingServiceError> {
        let existing = self
            .projects
            .project(project.id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if project.embedding.is_none() {
            project.embedding = existing.embedding.clone();
        }
        if project.describing_fields_changed(&existing) {
            self.summarize(&mut project).await;
        } else if project.summary.is_empty() {
            project.summary = existing.summary.clone();
        }
        if let Err(error) = self
            .lifecycle
            .refresh_project(&mut project, Some(&existing), false)
            .await
        {
            warn!(project_id = %project.id, %error, "project embedding refresh failed");
        }

        self.projects.update_project(project.clone()).await?;

        if let Some(end_date) = project.end_date.filter(|end| Some(*end) != existing.end_date) {
            self.notify_project_ending(&project, end_date).await?;
        }
        Ok(project)
    }

    pub async fn refresh_embedding(
        &self,
        id: ProjectId,
        force: bool,
    ) -> Result<Option<RefreshReason>, StaffingServiceError> {
        let mut project = self
            .projects
            .project(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let snapshot = project.clone();

        let outcome = self
            .lifecycle
            .refresh_project(&mut project, Some(&snapshot), force)
            .await;
        if project.embedding != snapshot.embedding {
            self.projects.update_project(project).await?;
        }
        Ok(outcome?)
    }

    pub async fn refresh_all(&self, force: bool) -> Result<usize, StaffingServiceError> {
        let mut projects = self.projects.list_projects().await?;
        let refreshed = self.lifecycle.refresh_projects(&mut projects, force).await?;
        if refreshed > 0 {
            for project in projects {
                self.projects.update_project(project).await?;
            }
        }
        info!(refreshed, "project embeddings refreshed");
        Ok(refreshed)
    }

    /// Best effort: a failed summary leaves the previous one in place.
    async fn summarize(&self, project: &mut Project) {
        match self
            .lifecycle
            .gateway()
            .summarize(&project.description, &project.seats_by_role)
            .await
        {
            Ok(summary) => project.summary = summary,
            Err(error) => warn!(project_id = %project.id, %error, "project summary failed"),
        }
    }

    async fn notify_project_ending(
        &self,
        project: &Project,
        end_date: chrono::NaiveDate,
    ) -> Result<(), StaffingServiceError> {
        let allocations = self.allocations.allocations_for_project(project.id).await?;
        let mut allocated: Vec<Candidate> = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            if allocated.iter().any(|c| c.id == allocation.candidate_id) {
                continue;
            }
            match self.candidates.candidate(allocation.candidate_id).await? {
                Some(candidate) => allocated.push(candidate),
                None => warn!(candidate_id = %allocation.candidate_id, "allocated candidate missing"),
            }
        }

        if allocated.is_empty() {
            info!(project_id = %project.id, "project ending with no allocated candidates");
            return Ok(());
        }
        self.notifications
            .dispatch(&triggers::project_ending(project, end_date, &allocated))
            .await;
        Ok(())
    }
}
