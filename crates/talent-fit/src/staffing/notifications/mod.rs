//! Event notifications fanned out to in-app and chat-ops channels.

pub mod chat_ops;
pub mod domain;
pub mod in_app;
pub mod orchestrator;
pub mod router;
pub mod triggers;

#[cfg(test)]
mod tests;

pub use chat_ops::{ChatOpsClient, ChatOpsNotifier, SlackClient};
pub use domain::{
    InAppNotification, NewInAppNotification, NotificationMessage, NotificationType, Recipient,
};
pub use in_app::{InAppNotifier, NotificationStore};
pub use orchestrator::{
    ChannelFailure, DispatchReport, NotificationOrchestrator, Notifier, NotifyError,
};
pub use router::dev_notification_router;
