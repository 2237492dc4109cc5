use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::domain::{InAppNotification, NewInAppNotification, NotificationMessage};
use super::orchestrator::{Notifier, NotifyError};
use crate::staffing::repository::RepositoryError;

/// Persistence for in-app notification rows.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(
        &self,
        notification: NewInAppNotification,
    ) -> Result<InAppNotification, RepositoryError>;

    async fn notifications_for_user(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<InAppNotification>, RepositoryError>;
}

/// Writes one row per recipient that names a concrete user.
pub struct InAppNotifier<S> {
    store: Arc<S>,
}

impl<S> InAppNotifier<S>
where
    S: NotificationStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> Notifier for InAppNotifier<S>
where
    S: NotificationStore + 'static,
{
    fn channel(&self) -> &'static str {
        "in-app"
    }

    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        let mut attempted = 0;
        let mut failed = 0;
        for user_id in message.recipients.iter().filter_map(|r| r.concrete_user()) {
            attempted += 1;
            let row = NewInAppNotification {
                user_id,
                kind: message.kind,
                message: message.body.clone(),
            };
            if let Err(error) = self.store.insert_notification(row).await {
                failed += 1;
                warn!(user_id, %error, "in-app notification insert failed");
            }
        }

        if failed > 0 {
            return Err(NotifyError::Partial { failed, attempted });
        }
        Ok(())
    }
}
