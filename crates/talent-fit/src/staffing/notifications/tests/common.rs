use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::staffing::notifications::{
    ChatOpsClient, NotificationMessage, NotificationType, Notifier, NotifyError, Recipient,
};

pub(super) fn message(recipients: Vec<Recipient>) -> NotificationMessage {
    NotificationMessage {
        kind: NotificationType::AllocationAssigned,
        subject: "New project allocation".to_string(),
        body: "You have been allocated to Ledger starting 2025-06-01".to_string(),
        metadata: BTreeMap::new(),
        recipients,
    }
}

pub(super) fn handle(handle: &str) -> Recipient {
    Recipient {
        chat_handle: Some(handle.to_string()),
        ..Recipient::default()
    }
}

/// Notifier that records messages or fails every send.
pub(super) struct RecordingNotifier {
    pub(super) channel: &'static str,
    pub(super) fail: bool,
    pub(super) sent: Mutex<Vec<NotificationMessage>>,
}

impl RecordingNotifier {
    pub(super) fn ok(channel: &'static str) -> Self {
        Self {
            channel,
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing(channel: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::ok(channel)
        }
    }

    pub(super) fn sent(&self) -> usize {
        self.sent.lock().expect("sent mutex poisoned").len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        self.channel
    }

    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Transport(format!("{} is down", self.channel)));
        }
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}

/// Chat client whose direct conversations succeed only for known handles.
#[derive(Default)]
pub(super) struct RecordingChatClient {
    pub(super) known_handles: Vec<String>,
    pub(super) fail_posts: bool,
    pub(super) posts: Mutex<Vec<(String, String)>>,
}

impl RecordingChatClient {
    pub(super) fn knowing(handles: &[&str]) -> Self {
        Self {
            known_handles: handles.iter().map(|h| h.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(super) fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().expect("posts mutex poisoned").clone()
    }
}

#[async_trait]
impl ChatOpsClient for RecordingChatClient {
    async fn open_direct_channel(&self, handle: &str) -> Result<String, NotifyError> {
        if self.known_handles.iter().any(|known| known == handle) {
            Ok(format!("D-{handle}"))
        } else {
            Err(NotifyError::Transport("user_not_found".to_string()))
        }
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        self.posts
            .lock()
            .expect("posts mutex poisoned")
            .push((channel.to_string(), text.to_string()));
        if self.fail_posts {
            return Err(NotifyError::Transport("channel_not_found".to_string()));
        }
        Ok(())
    }
}
