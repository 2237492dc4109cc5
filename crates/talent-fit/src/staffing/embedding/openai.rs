use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, CreateEmbeddingRequest,
    EmbeddingInput,
};
use async_openai::Client;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::{ChatProvider, ChatRequest, EmbeddingProvider, IndexedEmbedding, ProviderError};
use crate::config::AiConfig;

fn client(api_key: Option<&SecretString>, api_base: Option<&str>) -> Option<Client<OpenAIConfig>> {
    let key = api_key?;
    let mut config = OpenAIConfig::new().with_api_key(key.expose_secret());
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }
    Some(Client::with_config(config))
}

/// OpenAI embeddings endpoint.
pub struct OpenAiEmbeddings {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            client: client(config.openai_api_key.as_ref(), None),
            model: config.embedding_model.clone(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    #[tracing::instrument(skip_all, fields(model = %self.model, inputs = inputs.len()))]
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<IndexedEmbedding>, ProviderError> {
        let client = self
            .client
            .as_ref()
            .ok_or(ProviderError::Unconfigured("OPENAI_API_KEY is not set"))?;

        let request = CreateEmbeddingRequest {
            model: self.model.clone(),
            input: EmbeddingInput::StringArray(inputs),
            ..Default::default()
        };

        let response = client
            .embeddings()
            .create(request)
            .await
            .map_err(|err| ProviderError::Request(err.to_string()))?;

        debug!(vectors = response.data.len(), "embedding response");
        Ok(response
            .data
            .into_iter()
            .map(|item| IndexedEmbedding {
                index: item.index as usize,
                values: item.embedding,
            })
            .collect())
    }
}

/// OpenAI-compatible chat completions, pointed at a configurable base URL.
pub struct OpenAiChat {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiChat {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            client: client(
                config.chat_api_key.as_ref(),
                Some(config.chat_api_base_url.as_str()),
            ),
            model: config.chat_model.clone(),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: ChatRequest) -> Result<Vec<String>, ProviderError> {
        let client = self
            .client
            .as_ref()
            .ok_or(ProviderError::Unconfigured("CHAT_API_KEY is not set"))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system),
                    name: None,
                },
            ));
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(request.user),
                name: None,
            },
        ));

        let response = client
            .chat()
            .create(CreateChatCompletionRequest {
                model: self.model.clone(),
                messages,
                ..Default::default()
            })
            .await
            .map_err(|err| ProviderError::Request(err.to_string()))?;

        Ok(response
            .choices
            .into_iter()
            .map(|choice| choice.message.content.unwrap_or_default())
            .collect())
    }
}
