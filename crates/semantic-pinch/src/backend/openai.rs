//! Direct OpenAI-compatible chat-completions streaming.

use async_trait::async_trait;
use ladder::Level;
use serde::Serialize;
use serde_json::Value;

use super::sse::{check_status, fragment_stream};
use super::{BackendRequest, FragmentStream, TextBackend};
use crate::config::OpenAiConfig;
use crate::errors::TransformError;
use crate::prompts::{user_message, SYSTEM_PROMPT};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

fn extract_api_error_message(event: &Value) -> Option<String> {
    let error = event.get("error")?;
    if let Some(message) = error.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    if let Some(message) = error.as_str() {
        return Some(message.to_string());
    }
    Some("An error occurred during streaming".to_string())
}

/// Decode one chat-completion chunk into its `delta.content`.
pub(crate) fn decode_chunk(data: &str) -> Result<Option<String>, TransformError> {
    let event: Value = serde_json::from_str(data)
        .map_err(|e| TransformError::Transport(format!("SSE parsing error: {e}, data: {data}")))?;

    if let Some(message) = extract_api_error_message(&event) {
        return Err(TransformError::Transport(format!("SSE API error: {message}")));
    }

    let content = event
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(String::from);
    Ok(content)
}

pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    article_max_tokens: u32,
}

impl OpenAiBackend {
    /// # Errors
    ///
    /// `Configuration` when no API key is configured.
    pub fn new(client: reqwest::Client, config: &OpenAiConfig) -> Result<Self, TransformError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TransformError::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            article_max_tokens: config.article_max_tokens,
        })
    }

    fn max_tokens_for(&self, level: Level) -> u32 {
        if level == Level::Article {
            self.article_max_tokens
        } else {
            self.max_tokens
        }
    }
}

#[async_trait]
impl TextBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn open_stream(&self, request: &BackendRequest<'_>) -> Result<FragmentStream, TransformError> {
        let user = user_message(request.instruction, request.content);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens_for(request.to),
            stream: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(fragment_stream(response, decode_chunk))
    }
}
