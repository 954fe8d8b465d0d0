use super::{AnalysisResult, BackendError, InferenceBackend};
use crate::request::AnalysisRequest;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1";

pub struct ChatCompletionBackend {
    client: Client<OpenAIConfig>,
    model: String,
    system_prompt: Option<String>,
}

impl ChatCompletionBackend {
    pub fn new(
        base_url: &str,
        model: &str,
        api_token: Option<String>,
        system_prompt: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let mut config = OpenAIConfig::new().with_api_key(api_token.unwrap_or_default());
        if !base_url.is_empty() {
            config = config.with_api_base(base_url.trim_end_matches('/'));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::model_load(format!("Failed to create HTTP client: {}", e)))?;

        // No client-side backoff; attempts are counted by the retry executor
        let backoff = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Ok(Self {
            client: Client::with_config(config)
                .with_http_client(http_client)
                .with_backoff(backoff),
            model: model.to_string(),
            system_prompt: system_prompt.filter(|p| !p.trim().is_empty()),
        })
    }

    fn messages(&self, message: &str) -> Result<Vec<ChatCompletionRequestMessage>, BackendError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = &self.system_prompt {
            let system = ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt.as_str())
                .build()
                .map_err(|e| BackendError::runtime(format!("Failed to build system message: {}", e)))?;
            messages.push(system.into());
        }
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(message)
            .build()
            .map_err(|e| BackendError::runtime(format!("Failed to build user message: {}", e)))?;
        messages.push(user.into());
        Ok(messages)
    }
}

#[async_trait]
impl InferenceBackend for ChatCompletionBackend {
    fn name(&self) -> &'static str {
        "chat_completion"
    }

    async fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        let AnalysisRequest::Message { message } = request else {
            return Err(BackendError::runtime(format!(
                "chat_completion backend cannot serve {} requests",
                request.shape()
            )));
        };

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.messages(message)?)
            .build()
            .map_err(|e| BackendError::runtime(format!("Failed to build chat request: {}", e)))?;

        let response = self.client.chat().create(chat_request).await?;

        debug!(
            "Received chat completion response with {} choices",
            response.choices.len()
        );

        // No choices, or a choice without content, is an empty reply
        let reply = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(AnalysisResult::Reply(reply))
    }
}
