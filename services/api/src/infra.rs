use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use talent_fit::config::{AppConfig, DatabaseConfig};
use talent_fit::error::AppError;
use talent_fit::staffing::embedding::{
    EmbeddingGateway, EmbeddingLifecycle, OpenAiChat, OpenAiEmbeddings,
};
use talent_fit::staffing::matching::{ScoringEngine, ScoringRules};
use talent_fit::staffing::notifications::{
    ChatOpsNotifier, InAppNotifier, NotificationOrchestrator, Notifier,
};
use talent_fit::staffing::services::{
    AllocationService, CandidateService, ProjectService, StaffingServiceError,
};
use talent_fit::staffing::{
    Allocation, AllocationRepository, CandidateRepository, ProjectRepository,
};
use talent_fit::store::{InMemoryStaffingStore, PostgresStore};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    /// Pinged by `/ready` when staffing data lives in Postgres.
    pub(crate) database: Option<Arc<PostgresStore>>,
}

/// Where staffing data lives for this process.
#[derive(Clone)]
pub(crate) enum StaffingBackend {
    Postgres(Arc<PostgresStore>),
    InMemory(Arc<InMemoryStaffingStore>),
}

impl StaffingBackend {
    pub(crate) fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        match config.url.as_deref() {
            Some(url) => {
                let store = PostgresStore::connect_lazy(config, url)?;
                info!(max_connections = config.max_connections, "using postgres staffing store");
                Ok(Self::Postgres(Arc::new(store)))
            }
            None => {
                warn!("DATABASE_URL not set; staffing data is kept in memory");
                Ok(Self::InMemory(Arc::new(InMemoryStaffingStore::new())))
            }
        }
    }

    pub(crate) fn database(&self) -> Option<Arc<PostgresStore>> {
        match self {
            StaffingBackend::Postgres(store) => Some(store.clone()),
            StaffingBackend::InMemory(_) => None,
        }
    }

    fn in_app_notifier(&self) -> Arc<dyn Notifier> {
        match self {
            StaffingBackend::Postgres(store) => Arc::new(InAppNotifier::new(store.clone())),
            StaffingBackend::InMemory(store) => Arc::new(InAppNotifier::new(store.clone())),
        }
    }
}

/// Candidate, project and allocation services over one store.
pub(crate) struct StaffingServices<S> {
    pub(crate) candidates: CandidateService<S>,
    pub(crate) projects: ProjectService<S, S, S>,
    pub(crate) allocations: AllocationService<S, S, S>,
}

/// Counts written back by a bulk embedding refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct EmbeddingRefresh {
    pub(crate) candidates: usize,
    pub(crate) projects: usize,
}

impl<S> StaffingServices<S>
where
    S: CandidateRepository + ProjectRepository + AllocationRepository + 'static,
{
    fn new(
        store: Arc<S>,
        lifecycle: EmbeddingLifecycle,
        notifications: Arc<NotificationOrchestrator>,
    ) -> Self {
        Self {
            candidates: CandidateService::new(
                store.clone(),
                lifecycle.clone(),
                notifications.clone(),
            ),
            projects: ProjectService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                lifecycle,
                notifications.clone(),
            ),
            allocations: AllocationService::new(store.clone(), store.clone(), store, notifications),
        }
    }

    /// Candidates first, then projects. `force` re-embeds rows that already
    /// carry a vector.
    pub(crate) async fn refresh_embeddings(
        &self,
        force: bool,
    ) -> Result<EmbeddingRefresh, StaffingServiceError> {
        Ok(EmbeddingRefresh {
            candidates: self.candidates.refresh_all(force).await?,
            projects: self.projects.refresh_all(force).await?,
        })
    }
}

/// Staffing services bound to whichever backend the process runs against.
pub(crate) enum Services {
    Postgres(StaffingServices<PostgresStore>),
    InMemory(StaffingServices<InMemoryStaffingStore>),
}

impl Services {
    fn build(
        backend: &StaffingBackend,
        lifecycle: EmbeddingLifecycle,
        notifications: Arc<NotificationOrchestrator>,
    ) -> Self {
        match backend {
            StaffingBackend::Postgres(store) => Services::Postgres(StaffingServices::new(
                store.clone(),
                lifecycle,
                notifications,
            )),
            StaffingBackend::InMemory(store) => Services::InMemory(StaffingServices::new(
                store.clone(),
                lifecycle,
                notifications,
            )),
        }
    }

    pub(crate) async fn refresh_embeddings(
        &self,
        force: bool,
    ) -> Result<EmbeddingRefresh, StaffingServiceError> {
        match self {
            Services::Postgres(services) => services.refresh_embeddings(force).await,
            Services::InMemory(services) => services.refresh_embeddings(force).await,
        }
    }

    /// Stores the allocations and notifies each allocated candidate.
    pub(crate) async fn allocate(
        &self,
        allocations: Vec<Allocation>,
    ) -> Result<Vec<Allocation>, StaffingServiceError> {
        match self {
            Services::Postgres(services) => services.allocations.create(allocations).await,
            Services::InMemory(services) => services.allocations.create(allocations).await,
        }
    }
}

/// Everything the routes and commands share.
pub(crate) struct Components {
    pub(crate) backend: StaffingBackend,
    pub(crate) services: Services,
    pub(crate) scoring: Arc<ScoringEngine>,
    pub(crate) notifications: Arc<NotificationOrchestrator>,
    pub(crate) production: bool,
}

impl Components {
    pub(crate) fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let backend = StaffingBackend::connect(&config.database)?;
        let gateway = EmbeddingGateway::new(
            Arc::new(OpenAiEmbeddings::from_config(&config.ai)),
            Arc::new(OpenAiChat::from_config(&config.ai)),
            config.ai.embedding_dimensions,
        );

        let chat_ops = ChatOpsNotifier::from_config(&config.chat_ops);
        if !chat_ops.is_enabled() {
            warn!("SLACK_BOT_TOKEN not set; chat-ops notifications are disabled");
        }

        Ok(Self::assemble(
            backend,
            gateway,
            vec![Arc::new(chat_ops) as Arc<dyn Notifier>],
            config.is_production(),
        ))
    }

    /// In-app delivery always comes first, followed by `extra_channels`.
    pub(crate) fn assemble(
        backend: StaffingBackend,
        gateway: EmbeddingGateway,
        extra_channels: Vec<Arc<dyn Notifier>>,
        production: bool,
    ) -> Self {
        let mut notifiers = vec![backend.in_app_notifier()];
        notifiers.extend(extra_channels);
        let notifications = Arc::new(NotificationOrchestrator::new(notifiers));
        let services = Services::build(
            &backend,
            EmbeddingLifecycle::new(gateway.clone()),
            notifications.clone(),
        );

        Self {
            scoring: Arc::new(ScoringEngine::new(gateway, ScoringRules::default())),
            notifications,
            services,
            backend,
            production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use talent_fit::staffing::embedding::{
        ChatProvider, ChatRequest, EmbeddingProvider, IndexedEmbedding, ProviderError,
    };
    use talent_fit::staffing::notifications::{NotificationStore, NotificationType};
    use talent_fit::staffing::{AllocationId, Candidate, CandidateId, Project, ProjectId};

    const DIMENSIONS: usize = 3;

    struct UnitEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for UnitEmbeddings {
        async fn embed(&self, inputs: Vec<String>) -> Result<Vec<IndexedEmbedding>, ProviderError> {
            Ok((0..inputs.len())
                .map(|index| IndexedEmbedding {
                    index,
                    values: vec![1.0, 0.0, 0.0],
                })
                .collect())
        }
    }

    struct NoChat;

    #[async_trait]
    impl ChatProvider for NoChat {
        async fn complete(&self, _request: ChatRequest) -> Result<Vec<String>, ProviderError> {
            Err(ProviderError::Unconfigured("chat"))
        }
    }

    fn in_memory() -> (Arc<InMemoryStaffingStore>, Components) {
        let store = Arc::new(InMemoryStaffingStore::new());
        let gateway = EmbeddingGateway::new(Arc::new(UnitEmbeddings), Arc::new(NoChat), DIMENSIONS);
        let components = Components::assemble(
            StaffingBackend::InMemory(store.clone()),
            gateway,
            Vec::new(),
            false,
        );
        (store, components)
    }

    fn candidate(id: i64) -> Candidate {
        Candidate {
            id: CandidateId(id),
            user: None,
            geo: "Berlin".to_string(),
            profile_type: "engineer".to_string(),
            skills: vec!["rust".to_string()],
            years_of_experience: 4,
            industry: "fintech".to_string(),
            open_to_extra_work: false,
            date_of_joining: None,
            end_date: None,
            notice_date: None,
            embedding: None,
        }
    }

    fn project(id: i64) -> Project {
        let mut seats_by_role = BTreeMap::new();
        seats_by_role.insert("backend".to_string(), 2);
        Project {
            id: ProjectId(id),
            name: "Ledger".to_string(),
            description: "Payments ledger rewrite".to_string(),
            seats_by_role,
            summary: String::new(),
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: None,
            embedding: None,
        }
    }

    #[tokio::test]
    async fn refresh_embeds_missing_vectors_and_force_redoes_all() {
        let (store, components) = in_memory();
        store.insert_candidate(candidate(1)).await.expect("candidate stored");
        store.insert_candidate(candidate(2)).await.expect("candidate stored");
        store.insert_project(project(7)).await.expect("project stored");

        let first = components.services.refresh_embeddings(false).await.expect("refresh runs");
        assert_eq!(first, EmbeddingRefresh { candidates: 2, projects: 1 });
        let stored = store.candidate(CandidateId(1)).await.expect("reads").expect("exists");
        assert!(stored.embedding.is_some());

        let again = components.services.refresh_embeddings(false).await.expect("refresh runs");
        assert_eq!(again, EmbeddingRefresh { candidates: 0, projects: 0 });

        let forced = components.services.refresh_embeddings(true).await.expect("refresh runs");
        assert_eq!(forced, EmbeddingRefresh { candidates: 2, projects: 1 });
    }

    #[tokio::test]
    async fn allocate_stores_the_row_and_notifies_the_candidate() {
        let (store, components) = in_memory();
        store.insert_candidate(candidate(12)).await.expect("candidate stored");
        store.insert_project(project(7)).await.expect("project stored");

        let created = components
            .services
            .allocate(vec![Allocation {
                id: AllocationId(0),
                project_id: ProjectId(7),
                candidate_id: CandidateId(12),
                allocation_type: "billable".to_string(),
                start_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
                end_date: None,
            }])
            .await
            .expect("allocation created");

        assert_eq!(created.len(), 1);
        assert_ne!(created[0].id, AllocationId(0));
        let stored = store
            .allocations_for_candidate(CandidateId(12))
            .await
            .expect("reads");
        assert_eq!(stored, created);

        let inbox = store.notifications_for_user(12, true).await.expect("reads");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationType::AllocationAssigned);
    }

    #[test]
    fn in_memory_backend_has_no_database_to_ping() {
        let (_, components) = in_memory();
        assert!(components.backend.database().is_none());
    }
}
