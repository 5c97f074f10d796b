use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::generator::TextBackend;
use crate::types::MessageRole;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

// A reply must fit in a single post (280 characters), roughly 70 tokens.
// Leave headroom for models that pad their output.
const MAX_TOKENS: u32 = 256;

#[derive(Debug, Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenRouterClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
}

impl OpenRouterClient {
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            model,
        }
    }
}

impl TextBackend for OpenRouterClient {
    async fn complete(&self, messages: &[Message], temperature: f32) -> Result<String> {
        debug!(
            "Sending request to OpenRouter API with {} messages",
            messages.len()
        );

        let request = OpenRouterRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature,
        };

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::OpenRouterApi { status, message });
        }

        let api_response: OpenRouterResponse = response.json().await?;

        let reply = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BotError::OpenRouterResponse("No choices in response".to_string()))?
            .message
            .content
            .ok_or_else(|| BotError::OpenRouterResponse("Empty message content".to_string()))?;

        debug!("Received response from OpenRouter API");
        Ok(reply)
    }
}
