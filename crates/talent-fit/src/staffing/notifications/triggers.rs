//! Message builders for staffing state transitions.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime, SecondsFormat};

use super::domain::{NotificationMessage, NotificationType, Recipient};
use crate::staffing::domain::{Allocation, Candidate, Project};

/// Recipient addressing the candidate's own user account.
pub fn candidate_recipient(candidate: &Candidate) -> Recipient {
    let user = candidate.user.as_ref();
    Recipient {
        user_id: Some(candidate.id.0),
        email: user.map(|user| user.email.clone()).filter(|email| !email.is_empty()),
        chat_handle: user.and_then(|user| user.chat_handle.clone()),
        role: user.map(|user| user.role.clone()).filter(|role| !role.is_empty()),
    }
}

/// `YYYY-MM-DDT00:00:00Z`
fn midnight_utc(date: NaiveDate) -> String {
    date.and_time(NaiveTime::default())
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Candidate received an end date. Goes to the default destination only.
pub fn rolloff_alert(candidate: &Candidate, end_date: NaiveDate) -> NotificationMessage {
    let mut metadata = BTreeMap::new();
    metadata.insert("employeeId".to_string(), candidate.id.to_string());
    metadata.insert("endDate".to_string(), midnight_utc(end_date));

    NotificationMessage {
        kind: NotificationType::RolloffAlert,
        subject: "Employee rolling off".to_string(),
        body: format!(
            "Employee {} is rolling off on {}",
            candidate.display_name(),
            end_date.format("%Y-%m-%d")
        ),
        metadata,
        recipients: vec![Recipient::default()],
    }
}

pub fn allocation_assigned(
    candidate: &Candidate,
    project: &Project,
    allocation: &Allocation,
) -> NotificationMessage {
    let mut metadata = BTreeMap::new();
    metadata.insert("projectId".to_string(), project.id.to_string());
    metadata.insert("allocationId".to_string(), allocation.id.0.to_string());
    metadata.insert("startDate".to_string(), midnight_utc(allocation.start_date));

    NotificationMessage {
        kind: NotificationType::AllocationAssigned,
        subject: "New project allocation".to_string(),
        body: format!(
            "You have been allocated to {} starting {}",
            project.name,
            allocation.start_date.format("%Y-%m-%d")
        ),
        metadata,
        recipients: vec![candidate_recipient(candidate)],
    }
}

pub fn project_ending(
    project: &Project,
    end_date: NaiveDate,
    allocated: &[Candidate],
) -> NotificationMessage {
    let mut metadata = BTreeMap::new();
    metadata.insert("projectId".to_string(), project.id.to_string());
    metadata.insert("endDate".to_string(), midnight_utc(end_date));

    NotificationMessage {
        kind: NotificationType::ProjectEnding,
        subject: "Project ending".to_string(),
        body: format!(
            "Project {} is ending on {}",
            project.name,
            end_date.format("%Y-%m-%d")
        ),
        metadata,
        recipients: allocated.iter().map(candidate_recipient).collect(),
    }
}

/// Canned message for exercising every channel end to end.
pub fn test_notification() -> NotificationMessage {
    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), "dev-endpoint".to_string());

    NotificationMessage {
        kind: NotificationType::AllocationAssigned,
        subject: "TalentFit Test".to_string(),
        body: "This is a test notification from TalentFit".to_string(),
        metadata,
        recipients: vec![Recipient::default()],
    }
}
