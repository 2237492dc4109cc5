use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use mockito::{Matcher, Server};
use secrecy::SecretString;
use serde_json::json;
use talent_fit::staffing::embedding::{
    ChatProvider, ChatRequest, EmbeddingGateway, EmbeddingLifecycle, EmbeddingProvider,
    IndexedEmbedding, ProviderError,
};
use talent_fit::staffing::notifications::{
    ChatOpsNotifier, InAppNotifier, NotificationOrchestrator, NotificationType, Notifier,
    SlackClient,
};
use talent_fit::staffing::services::{AllocationService, CandidateService};
use talent_fit::staffing::{
    Allocation, AllocationId, Candidate, CandidateId, Project, ProjectId, ProjectRepository,
    UserSummary,
};
use talent_fit::store::InMemoryStaffingStore;

struct FlatEmbeddings;

#[async_trait]
impl EmbeddingProvider for FlatEmbeddings {
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<IndexedEmbedding>, ProviderError> {
        Ok((0..inputs.len())
            .map(|index| IndexedEmbedding {
                index,
                values: vec![1.0, 0.0],
            })
            .collect())
    }
}

struct SilentChat;

#[async_trait]
impl ChatProvider for SilentChat {
    async fn complete(&self, _request: ChatRequest) -> Result<Vec<String>, ProviderError> {
        Err(ProviderError::Unconfigured("chat"))
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn candidate() -> Candidate {
    Candidate {
        id: CandidateId(10),
        user: Some(UserSummary {
            first_name: "Priya".to_string(),
            last_name: "Nair".to_string(),
            email: "priya@example.com".to_string(),
            role: "employee".to_string(),
            chat_handle: Some("U10".to_string()),
        }),
        geo: "India".to_string(),
        profile_type: "Backend".to_string(),
        skills: vec!["go".to_string()],
        years_of_experience: 6,
        industry: "Fintech".to_string(),
        open_to_extra_work: false,
        date_of_joining: None,
        end_date: None,
        notice_date: None,
        embedding: None,
    }
}

fn orchestrator(store: Arc<InMemoryStaffingStore>, server: &Server) -> Arc<NotificationOrchestrator> {
    let slack = Arc::new(SlackClient::new(
        server.url(),
        SecretString::from("xoxb-test".to_string()),
    ));
    Arc::new(NotificationOrchestrator::new(vec![
        Arc::new(InAppNotifier::new(store)) as Arc<dyn Notifier>,
        Arc::new(ChatOpsNotifier::new(Some(slack), Some("C-staffing".to_string())))
            as Arc<dyn Notifier>,
    ]))
}

#[tokio::test]
async fn allocation_reaches_candidate_in_app_and_by_direct_message() {
    let mut server = Server::new_async().await;
    let open = server
        .mock("POST", "/conversations.open")
        .match_header("authorization", "Bearer xoxb-test")
        .match_body(Matcher::PartialJson(json!({ "users": "U10" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true, "channel": {"id": "D10"}}"#)
        .expect(1)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/chat.postMessage")
        .match_body(Matcher::PartialJson(json!({ "channel": "D10" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(InMemoryStaffingStore::new());
    store
        .insert_project(Project {
            id: ProjectId(5),
            name: "Ledger".to_string(),
            description: "Payments ledger".to_string(),
            seats_by_role: BTreeMap::new(),
            summary: String::new(),
            start_date: Some(date(2025, 6, 1)),
            end_date: None,
            embedding: None,
        })
        .await
        .expect("project seeded");
    talent_fit::staffing::CandidateRepository::insert_candidate(store.as_ref(), candidate())
        .await
        .expect("candidate seeded");

    let service = AllocationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        orchestrator(store.clone(), &server),
    );
    service
        .create(vec![Allocation {
            id: AllocationId(0),
            project_id: ProjectId(5),
            candidate_id: CandidateId(10),
            allocation_type: "billable".to_string(),
            start_date: date(2025, 6, 2),
            end_date: None,
        }])
        .await
        .expect("allocation created");

    open.assert_async().await;
    post.assert_async().await;
    let rows = store.notifications().expect("rows readable");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, 10);
    assert_eq!(rows[0].kind, NotificationType::AllocationAssigned);
    assert_eq!(
        rows[0].message,
        "You have been allocated to Ledger starting 2025-06-02"
    );
}

#[tokio::test]
async fn rolloff_alert_goes_to_default_channel_only() {
    let mut server = Server::new_async().await;
    let open = server
        .mock("POST", "/conversations.open")
        .expect(0)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/chat.postMessage")
        .match_body(Matcher::PartialJson(json!({ "channel": "C-staffing" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(InMemoryStaffingStore::new());
    let gateway = EmbeddingGateway::new(Arc::new(FlatEmbeddings), Arc::new(SilentChat), 2);
    let service = CandidateService::new(
        store.clone(),
        EmbeddingLifecycle::new(gateway),
        orchestrator(store.clone(), &server),
    );
    service.create(candidate()).await.expect("candidate created");

    let mut leaving = candidate();
    leaving.end_date = Some(date(2025, 7, 31));
    service.update(leaving).await.expect("candidate updated");

    open.assert_async().await;
    post.assert_async().await;
    assert!(store.notifications().expect("rows readable").is_empty());
}
