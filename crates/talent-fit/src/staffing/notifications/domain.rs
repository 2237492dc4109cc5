use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    RolloffAlert,
    ProjectEnding,
    AllocationAssigned,
    ProjectGap,
    AllocationSuggestion,
}

impl NotificationType {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationType::RolloffAlert => "rolloff-alert",
            NotificationType::ProjectEnding => "project-ending",
            NotificationType::AllocationAssigned => "allocation-assigned",
            NotificationType::ProjectGap => "project-gap",
            NotificationType::AllocationSuggestion => "allocation-suggestion",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            NotificationType::RolloffAlert,
            NotificationType::ProjectEnding,
            NotificationType::AllocationAssigned,
            NotificationType::ProjectGap,
            NotificationType::AllocationSuggestion,
        ]
        .into_iter()
        .find(|kind| kind.label() == label)
    }
}

/// Delivery target. No `user_id` means no concrete user; channels may fall back
/// to a default destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Recipient {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// User id when it names a concrete user.
    pub fn concrete_user(&self) -> Option<i64> {
        self.user_id.filter(|id| *id > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

impl NotificationMessage {
    /// Plain-text rendering used by chat channels.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.subject, self.body)
    }
}

/// Row written by the in-app channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InAppNotification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInAppNotification {
    pub user_id: i64,
    pub kind: NotificationType,
    pub message: String,
}
