use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::staffing::domain::{
    Allocation, AllocationId, Candidate, CandidateId, EmbeddingVector, Project, ProjectId,
    UserSummary,
};
use crate::staffing::embedding::fakes::{FixedEmbeddings, ScriptedChat};
use crate::staffing::embedding::EmbeddingGateway;
use crate::staffing::matching::{MatchOrchestrator, ScoringEngine, ScoringRules};
use crate::staffing::repository::{AllocationRepository, CandidateRepository, ProjectRepository};
use crate::store::InMemoryStaffingStore;

pub(super) type Orchestrator = MatchOrchestrator<InMemoryStaffingStore, InMemoryStaffingStore>;

pub(super) const TARGET: ProjectId = ProjectId(1);
pub(super) const OTHER: ProjectId = ProjectId(2);
pub(super) const UNEMBEDDED: ProjectId = ProjectId(3);

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn candidate(id: i64, name: &str, embedding: Option<Vec<f32>>, open: bool) -> Candidate {
    let (first, last) = name.split_once(' ').unwrap_or((name, ""));
    Candidate {
        id: CandidateId(id),
        user: Some(UserSummary {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            role: "employee".to_string(),
            chat_handle: None,
        }),
        geo: "India".to_string(),
        profile_type: "Backend".to_string(),
        skills: vec!["go".to_string(), "postgres".to_string()],
        years_of_experience: 5,
        industry: "Fintech".to_string(),
        open_to_extra_work: open,
        date_of_joining: Some(date(2021, 3, 1)),
        end_date: None,
        notice_date: None,
        embedding: embedding.map(EmbeddingVector::new),
    }
}

pub(super) fn project(id: ProjectId, embedding: Option<Vec<f32>>) -> Project {
    let mut seats = BTreeMap::new();
    seats.insert("backend".to_string(), 2);
    Project {
        id,
        name: format!("Project {}", id.0),
        description: "Payments ledger rebuild".to_string(),
        seats_by_role: seats,
        summary: "Project requires: Skills: go, postgres".to_string(),
        start_date: Some(date(2025, 6, 1)),
        end_date: None,
        embedding: embedding.map(EmbeddingVector::new),
    }
}

fn open_allocation(candidate: i64, project: ProjectId) -> Allocation {
    Allocation {
        id: AllocationId(0),
        project_id: project,
        candidate_id: CandidateId(candidate),
        allocation_type: "billable".to_string(),
        start_date: date(2025, 1, 1),
        end_date: None,
    }
}

/// Asha (10) is unallocated, Ben (11) is busy but open to extra work, Chen (12)
/// is fully booked elsewhere, Dara (13) is already on the target, Eli (14) has
/// no embedding.
pub(super) async fn seeded_store() -> Arc<InMemoryStaffingStore> {
    let store = Arc::new(InMemoryStaffingStore::new());
    for project in [
        project(TARGET, Some(vec![1.0, 0.0, 0.0])),
        project(OTHER, Some(vec![0.0, 1.0, 0.0])),
        project(UNEMBEDDED, None),
    ] {
        store.insert_project(project).await.expect("project seeded");
    }

    for candidate in [
        candidate(10, "Asha Rao", Some(vec![1.0, 0.0, 0.0]), false),
        candidate(11, "Ben Ortiz", Some(vec![0.8, 0.6, 0.0]), true),
        candidate(12, "Chen Li", Some(vec![0.9, 0.1, 0.0]), false),
        candidate(13, "Dara Kim", Some(vec![0.6, 0.8, 0.0]), true),
        candidate(14, "Eli Noor", None, false),
    ] {
        store.insert_candidate(candidate).await.expect("candidate seeded");
    }

    for allocation in [
        open_allocation(11, OTHER),
        open_allocation(12, OTHER),
        open_allocation(13, TARGET),
    ] {
        store.insert_allocation(allocation).await.expect("allocation seeded");
    }
    store
}

pub(super) fn gateway(chat: Arc<ScriptedChat>) -> EmbeddingGateway {
    EmbeddingGateway::new(Arc::new(FixedEmbeddings::new(3)), chat, 3)
}

pub(super) fn orchestrator(store: Arc<InMemoryStaffingStore>, chat: Arc<ScriptedChat>) -> Orchestrator {
    let scoring = Arc::new(ScoringEngine::new(gateway(chat), ScoringRules::default()));
    MatchOrchestrator::new(store.clone(), store, scoring)
}
