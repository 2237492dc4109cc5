use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::NotificationMessage;

/// One delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no destination resolved for recipient")]
    NoDestination,
    #[error("{failed} of {attempted} deliveries failed")]
    Partial { failed: usize, attempted: usize },
    #[error("notification store failed: {0}")]
    Store(String),
    #[error("chat-ops transport failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelFailure {
    pub channel: &'static str,
    pub error: String,
}

/// Outcome of one dispatch. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<ChannelFailure>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fans a message out to every registered channel, in registration order.
#[derive(Clone, Default)]
pub struct NotificationOrchestrator {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotificationOrchestrator {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    pub fn channels(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|notifier| notifier.channel()).collect()
    }

    /// Never fails: each channel error is logged and recorded in the report.
    #[tracing::instrument(skip_all, fields(kind = message.kind.label()))]
    pub async fn dispatch(&self, message: &NotificationMessage) -> DispatchReport {
        let mut report = DispatchReport::default();
        for notifier in &self.notifiers {
            let channel = notifier.channel();
            match notifier.send(message).await {
                Ok(()) => report.delivered.push(channel),
                Err(error) => {
                    warn!(channel, %error, "notification channel failed");
                    report.failed.push(ChannelFailure {
                        channel,
                        error: error.to_string(),
                    });
                }
            }
        }
        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "notification dispatched"
        );
        report
    }
}
