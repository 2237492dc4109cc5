use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::staffing::domain::{
    Allocation, AllocationId, Candidate, CandidateId, Project, ProjectId, UserSummary,
};
use crate::staffing::embedding::fakes::{FixedEmbeddings, ScriptedChat};
use crate::staffing::embedding::{EmbeddingGateway, EmbeddingLifecycle};
use crate::staffing::notifications::{
    InAppNotifier, NotificationMessage, NotificationOrchestrator, NotificationType, Notifier,
    NotifyError,
};
use crate::store::InMemoryStaffingStore;

pub(super) const DIMENSIONS: usize = 3;

/// Captures every dispatched message.
#[derive(Default)]
pub(super) struct CapturingNotifier {
    messages: Mutex<Vec<NotificationMessage>>,
}

impl CapturingNotifier {
    pub(super) fn of_kind(&self, kind: NotificationType) -> Vec<NotificationMessage> {
        self.messages
            .lock()
            .expect("messages mutex poisoned")
            .iter()
            .filter(|message| message.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    fn channel(&self) -> &'static str {
        "capture"
    }

    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .expect("messages mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}

/// Store, providers, and an orchestrator fanning out to in-app rows on the
/// same store plus a capturing channel.
pub(super) struct Harness {
    pub(super) store: Arc<InMemoryStaffingStore>,
    pub(super) captured: Arc<CapturingNotifier>,
    pub(super) embeddings: Arc<FixedEmbeddings>,
    pub(super) chat: Arc<ScriptedChat>,
    pub(super) lifecycle: EmbeddingLifecycle,
    pub(super) notifications: Arc<NotificationOrchestrator>,
}

impl Harness {
    pub(super) fn new(chat: ScriptedChat) -> Self {
        Self::with_gateway_dimensions(chat, DIMENSIONS)
    }

    /// A gateway expecting a different width than the provider returns fails
    /// every embedding call.
    pub(super) fn with_gateway_dimensions(chat: ScriptedChat, dimensions: usize) -> Self {
        let store = Arc::new(InMemoryStaffingStore::new());
        let embeddings = Arc::new(FixedEmbeddings::new(DIMENSIONS));
        let chat = Arc::new(chat);
        let gateway = EmbeddingGateway::new(embeddings.clone(), chat.clone(), dimensions);
        let captured = Arc::new(CapturingNotifier::default());
        let notifications = Arc::new(NotificationOrchestrator::new(vec![
            Arc::new(InAppNotifier::new(store.clone())) as Arc<dyn Notifier>,
            captured.clone() as Arc<dyn Notifier>,
        ]));
        Self {
            store,
            captured,
            embeddings,
            chat,
            lifecycle: EmbeddingLifecycle::new(gateway),
            notifications,
        }
    }

    pub(super) fn embed_calls(&self) -> usize {
        self.embeddings.calls().len()
    }
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn candidate(id: i64) -> Candidate {
    Candidate {
        id: CandidateId(id),
        user: Some(UserSummary {
            first_name: "Priya".to_string(),
            last_name: format!("N{id}"),
            email: format!("priya{id}@example.com"),
            role: "employee".to_string(),
            chat_handle: None,
        }),
        geo: "India".to_string(),
        profile_type: "Backend".to_string(),
        skills: vec!["go".to_string(), "postgres".to_string()],
        years_of_experience: 4,
        industry: "Fintech".to_string(),
        open_to_extra_work: false,
        date_of_joining: Some(date(2022, 1, 10)),
        end_date: None,
        notice_date: None,
        embedding: None,
    }
}

pub(super) fn project(id: i64) -> Project {
    let mut seats = BTreeMap::new();
    seats.insert("backend".to_string(), 2);
    Project {
        id: ProjectId(id),
        name: "Ledger".to_string(),
        description: "Rebuild the payments ledger in go".to_string(),
        seats_by_role: seats,
        summary: String::new(),
        start_date: Some(date(2025, 6, 1)),
        end_date: None,
        embedding: None,
    }
}

pub(super) fn allocation(project: i64, candidate: i64) -> Allocation {
    Allocation {
        id: AllocationId(0),
        project_id: ProjectId(project),
        candidate_id: CandidateId(candidate),
        allocation_type: "billable".to_string(),
        start_date: date(2025, 6, 1),
        end_date: None,
    }
}
