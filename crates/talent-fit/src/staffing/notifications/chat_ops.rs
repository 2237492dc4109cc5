use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::domain::NotificationMessage;
use super::orchestrator::{Notifier, NotifyError};
use crate::config::ChatOpsConfig;

/// Minimal chat workspace API: open a direct conversation and post text.
#[async_trait]
pub trait ChatOpsClient: Send + Sync {
    async fn open_direct_channel(&self, handle: &str) -> Result<String, NotifyError>;
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Deserialize)]
struct SlackEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<SlackChannel>,
}

#[derive(Debug, Deserialize)]
struct SlackChannel {
    id: String,
}

/// Slack Web API over `reqwest`, authenticated with a bot token.
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl SlackClient {
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<SlackEnvelope, NotifyError> {
        let url = format!("{}/{method}", self.base_url);
        let envelope: SlackEnvelope = self
            .http
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| NotifyError::Transport(err.to_string()))?
            .json()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        if !envelope.ok {
            let reason = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
            return Err(NotifyError::Transport(format!("{method}: {reason}")));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl ChatOpsClient for SlackClient {
    async fn open_direct_channel(&self, handle: &str) -> Result<String, NotifyError> {
        let envelope = self
            .call(
                "conversations.open",
                json!({ "users": handle, "return_im": true }),
            )
            .await?;
        envelope
            .channel
            .map(|channel| channel.id)
            .ok_or_else(|| NotifyError::Transport("conversations.open: missing channel".to_string()))
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        self.call("chat.postMessage", json!({ "channel": channel, "text": text }))
            .await
            .map(|_| ())
    }
}

/// Chat-ops channel. Without a client it is inert and makes no calls.
pub struct ChatOpsNotifier<C> {
    client: Option<Arc<C>>,
    default_channel: Option<String>,
}

impl ChatOpsNotifier<SlackClient> {
    pub fn from_config(config: &ChatOpsConfig) -> Self {
        let client = config
            .bot_token
            .clone()
            .map(|token| Arc::new(SlackClient::new(config.api_base_url.clone(), token)));
        Self::new(client, config.default_channel_id.clone())
    }
}

impl<C> ChatOpsNotifier<C>
where
    C: ChatOpsClient + 'static,
{
    pub fn new(client: Option<Arc<C>>, default_channel: Option<String>) -> Self {
        Self {
            client,
            default_channel,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn resolve_channel(&self, client: &C, handle: Option<&str>) -> Option<String> {
        if let Some(handle) = handle.filter(|handle| !handle.is_empty()) {
            match client.open_direct_channel(handle).await {
                Ok(channel) => return Some(channel),
                Err(error) => {
                    warn!(handle, %error, "direct conversation failed, using default channel");
                }
            }
        }
        self.default_channel.clone()
    }
}

#[async_trait]
impl<C> Notifier for ChatOpsNotifier<C>
where
    C: ChatOpsClient + 'static,
{
    fn channel(&self) -> &'static str {
        "chat-ops"
    }

    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        let Some(client) = self.client.as_deref() else {
            debug!("chat-ops disabled, skipping");
            return Ok(());
        };

        let text = message.text();
        let mut unresolved = false;
        for recipient in &message.recipients {
            let Some(channel) = self
                .resolve_channel(client, recipient.chat_handle.as_deref())
                .await
            else {
                unresolved = true;
                continue;
            };

            if let Err(error) = client.post_message(&channel, &text).await {
                warn!(%channel, %error, "chat-ops post failed");
            }
        }

        if unresolved {
            return Err(NotifyError::NoDestination);
        }
        Ok(())
    }
}
