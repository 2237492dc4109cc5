use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::staffing::domain::{Allocation, Candidate, ProjectId};

/// Half-width of the window around the target project's start in which a
/// rolling-off allocation must end for its holder to count as on the bench.
pub const ROLLOFF_GRACE_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EligibilityStatus {
    #[serde(rename = "onBench")]
    OnBench,
    #[serde(rename = "onWork")]
    OnWork,
}

impl EligibilityStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EligibilityStatus::OnBench => "onBench",
            EligibilityStatus::OnWork => "onWork",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "onBench" => Some(EligibilityStatus::OnBench),
            "onWork" => Some(EligibilityStatus::OnWork),
            _ => None,
        }
    }
}

/// Inclusive `[start - 7 days, start + 7 days]`. Allocations that ended
/// earlier are history and say nothing about current availability.
pub fn rolloff_window(project_start: NaiveDate) -> (NaiveDate, NaiveDate) {
    let grace = Days::new(ROLLOFF_GRACE_DAYS);
    (
        project_start.checked_sub_days(grace).unwrap_or(NaiveDate::MIN),
        project_start.checked_add_days(grace).unwrap_or(NaiveDate::MAX),
    )
}

/// Classifies a candidate against one target project. `None` excludes the
/// candidate from the pool. `allocations` may include other candidates' rows.
pub fn classify(
    candidate: &Candidate,
    allocations: &[Allocation],
    project_id: ProjectId,
    project_start: NaiveDate,
) -> Option<EligibilityStatus> {
    let own: Vec<&Allocation> = allocations
        .iter()
        .filter(|allocation| allocation.candidate_id == candidate.id)
        .collect();

    let has_open_ended = own.iter().any(|allocation| allocation.is_open_ended());
    let on_target = own
        .iter()
        .any(|allocation| allocation.project_id == project_id);
    let (earliest, latest) = rolloff_window(project_start);
    let rolling_off = own.iter().any(|allocation| {
        matches!(allocation.end_date, Some(end) if earliest <= end && end <= latest)
    });

    if !has_open_ended || (!candidate.open_to_extra_work && !on_target && rolling_off) {
        Some(EligibilityStatus::OnBench)
    } else if candidate.open_to_extra_work && !on_target {
        Some(EligibilityStatus::OnWork)
    } else {
        None
    }
}
