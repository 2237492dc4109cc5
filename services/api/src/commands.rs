use crate::infra::{Components, StaffingBackend};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use talent_fit::config::AppConfig;
use talent_fit::error::AppError;
use talent_fit::staffing::matching::{MatchOrchestrator, ScoringEngine, VectorStore};
use talent_fit::staffing::notifications::triggers::test_notification;
use talent_fit::staffing::{Allocation, AllocationId, CandidateId, ProjectDirectory, ProjectId};
use talent_fit::telemetry;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// Numeric project identifier
    #[arg(long)]
    pub(crate) project_id: String,
    /// Maximum candidates for the similarity ranking (values <= 0 use the default)
    #[arg(long)]
    pub(crate) limit: Option<i64>,
    /// Print the raw similarity ranking instead of scored suggestions
    #[arg(long)]
    pub(crate) similar: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RefreshArgs {
    /// Re-embed candidates and projects that already have a vector
    #[arg(long)]
    pub(crate) force: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    #[arg(long)]
    pub(crate) project_id: i64,
    #[arg(long)]
    pub(crate) candidate_id: i64,
    /// Allocation type, e.g. billable or shadow
    #[arg(long = "type", default_value = "billable")]
    pub(crate) allocation_type: String,
    /// First day of the allocation (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) start: NaiveDate,
    /// Last day of the allocation; open-ended when omitted
    #[arg(long)]
    pub(crate) end: Option<NaiveDate>,
}

impl AllocateArgs {
    fn into_allocation(self) -> Allocation {
        Allocation {
            id: AllocationId(0),
            project_id: ProjectId(self.project_id),
            candidate_id: CandidateId(self.candidate_id),
            allocation_type: self.allocation_type,
            start_date: self.start,
            end_date: self.end,
        }
    }
}

fn bootstrap() -> Result<Components, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Components::from_config(&config)
}

pub(crate) async fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let components = bootstrap()?;
    let scoring = components.scoring.clone();
    match &components.backend {
        StaffingBackend::Postgres(store) => {
            print_matches(store.clone(), store.clone(), scoring, &args).await
        }
        StaffingBackend::InMemory(store) => {
            print_matches(store.clone(), store.clone(), scoring, &args).await
        }
    }
}

async fn print_matches<P, V>(
    projects: Arc<P>,
    store: Arc<V>,
    scoring: Arc<ScoringEngine>,
    args: &MatchArgs,
) -> Result<(), AppError>
where
    P: ProjectDirectory + 'static,
    V: VectorStore + 'static,
{
    let orchestrator = MatchOrchestrator::new(projects, store, scoring);
    if args.similar {
        let ranking = orchestrator
            .similar_candidates(&args.project_id, args.limit.unwrap_or(0))
            .await?;
        print_json(&ranking)
    } else {
        let suggestions = orchestrator
            .generate_match_suggestions(&args.project_id)
            .await?;
        print_json(&suggestions)
    }
}

pub(crate) async fn run_notify_test() -> Result<(), AppError> {
    let components = bootstrap()?;
    info!(channels = ?components.notifications.channels(), "dispatching test notification");
    let report = components
        .notifications
        .dispatch(&test_notification())
        .await;
    print_json(&report)
}

pub(crate) async fn run_refresh_embeddings(args: RefreshArgs) -> Result<(), AppError> {
    let components = bootstrap()?;
    let refreshed = components.services.refresh_embeddings(args.force).await?;
    info!(
        candidates = refreshed.candidates,
        projects = refreshed.projects,
        force = args.force,
        "embedding refresh finished"
    );
    print_json(&refreshed)
}

pub(crate) async fn run_allocate(args: AllocateArgs) -> Result<(), AppError> {
    let components = bootstrap()?;
    let created = components
        .services
        .allocate(vec![args.into_allocation()])
        .await?;
    print_json(&created)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}
