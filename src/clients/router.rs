use crate::config::{KeyFromEnv, DEFAULT_LLM_BASE_URL};
use crate::core::ChatCompletionClient;
use crate::error::GatewayError;
use crate::prompt::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Configuration for an OpenAI-compatible chat-completion router
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Base URL without the `/chat/completions` suffix
    pub base_url: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: RouterClient::find_key().unwrap_or_default(),
            timeout: None,
        }
    }
}

/// Client for the Hugging Face inference router, or any endpoint speaking the
/// same `/chat/completions` protocol.
#[derive(Clone, Debug)]
pub struct RouterClient {
    config: RouterConfig,
    client: Client,
}

impl KeyFromEnv for RouterClient {
    const KEY_NAME: &'static str = "HF_API_KEY";
}

impl RouterClient {
    pub fn new(config: RouterConfig) -> Self {
        info!(base_url = %config.base_url, "Creating new router client");
        if config.api_key.is_empty() {
            warn!(key = Self::KEY_NAME, "No API key configured; upstream will reject requests");
        }
        Self { config, client: Client::new() }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatCompletionClient for RouterClient {
    #[instrument(skip_all, fields(model = %model, message_count = messages.len(), max_tokens = max_tokens))]
    async fn complete(&self, model: &str, messages: Vec<ChatMessage>, max_tokens: u32) -> Result<String, GatewayError> {
        let request = CompletionRequest { model, messages, max_tokens };

        debug!("Sending request to chat-completion router");
        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "HTTP request failed");
            GatewayError::from_transport(e)
        })?;

        let status = response.status();
        debug!(status = %status, "Received response from router");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "Router API error");
            return Err(GatewayError::Status { status: status.as_u16(), body });
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse router response JSON");
            GatewayError::Protocol(e.to_string())
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                error!("No content in router response");
                GatewayError::Protocol("No choices in response".to_string())
            })?;

        info!(response_len = content.len(), "Successfully received model reply");
        Ok(content)
    }

    fn clone_box(&self) -> Box<dyn ChatCompletionClient> {
        Box::new(self.clone())
    }
}
