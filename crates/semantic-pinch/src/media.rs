//! Image generation and captioning through a Replicate-style prediction API.
//!
//! Both operations create a prediction, then poll `GET /predictions/{id}` at a
//! fixed interval until it reaches `succeeded` or `failed`/`canceled`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::backend::sse::check_status;
use crate::config::MediaConfig;
use crate::errors::TransformError;

const IMAGE_MODEL_PATH: &str = "models/black-forest-labs/flux-schnell/predictions";
const CAPTION_MODEL_VERSION: &str =
    "f677695e5e89f8b236e52ecd1d3f01beb44c34606419bcc19345e046d8f786f9";
const CAPTION_QUESTION: &str = "Generate a caption for this image in one short sentence.";
const IMAGE_PROMPT_SUFFIX: &str = ", best quality 4k";
const PUBLIC_REPLICATE_HOST: &str = "https://api.replicate.com";

#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Render `prompt` to an image; returns its URL.
    async fn generate_image(&self, prompt: &str) -> Result<String, TransformError>;

    /// Describe the image at `image_url` in one short sentence.
    async fn caption(&self, image_url: &str) -> Result<String, TransformError>;
}

#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Option<Value>,
}

enum PredictionState {
    Pending,
    Succeeded(Value),
    Failed(String),
}

impl Prediction {
    fn state(self) -> PredictionState {
        match self.status.as_str() {
            "succeeded" => PredictionState::Succeeded(self.output),
            "failed" | "canceled" => {
                let reason = match self.error {
                    Some(Value::String(s)) => s,
                    Some(other) if !other.is_null() => other.to_string(),
                    _ => format!("prediction {}", self.status),
                };
                PredictionState::Failed(reason)
            }
            _ => PredictionState::Pending,
        }
    }
}

/// First URL of an image prediction's output (string or array of strings).
fn image_url_from_output(output: &Value) -> Option<String> {
    let url = match output {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    }?;
    let url = url.trim();
    (!url.is_empty()).then(|| url.to_string())
}

/// Trimmed caption with one trailing period removed.
fn caption_from_output(output: &Value) -> Option<String> {
    let text = output.as_str()?.trim();
    let text = text.strip_suffix('.').unwrap_or(text);
    (!text.is_empty()).then(|| text.to_string())
}

pub struct ReplicateMedia {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    poll_interval: Duration,
    max_polls: u32,
}

impl ReplicateMedia {
    /// # Errors
    ///
    /// `Configuration` when talking to the public API without a token.
    pub fn new(client: reqwest::Client, config: &MediaConfig) -> Result<Self, TransformError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let api_token = config.api_token.clone().filter(|t| !t.trim().is_empty());
        if api_token.is_none() && base_url.starts_with(PUBLIC_REPLICATE_HOST) {
            return Err(TransformError::Configuration(
                "REPLICATE_API_TOKEN is not set".to_string(),
            ));
        }
        Ok(Self {
            client,
            base_url,
            api_token,
            poll_interval: config.poll_interval(),
            max_polls: config.max_polls,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn create(&self, path: &str, body: Value) -> Result<Prediction, TransformError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.authorize(self.client.post(&url)).json(&body).send().await?;
        let response = check_status(response).await?;
        response
            .json::<Prediction>()
            .await
            .map_err(|e| TransformError::Media(format!("invalid prediction response: {e}")))
    }

    async fn fetch(&self, id: &str) -> Result<Prediction, TransformError> {
        let url = format!("{}/predictions/{}", self.base_url, id);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = check_status(response).await?;
        response
            .json::<Prediction>()
            .await
            .map_err(|e| TransformError::Media(format!("invalid prediction response: {e}")))
    }

    /// Poll until the prediction settles; returns its output.
    async fn settle(&self, prediction: Prediction) -> Result<Value, TransformError> {
        let id = prediction.id.clone();
        let mut current = prediction;
        for poll in 0..=self.max_polls {
            match current.state() {
                PredictionState::Succeeded(output) => return Ok(output),
                PredictionState::Failed(reason) => {
                    return Err(TransformError::Media(format!("prediction {id} failed: {reason}")))
                }
                PredictionState::Pending => {}
            }
            if poll == self.max_polls {
                break;
            }
            debug!(prediction = %id, poll, "Prediction pending");
            tokio::time::sleep(self.poll_interval).await;
            current = self.fetch(&id).await?;
        }
        Err(TransformError::Media(format!(
            "prediction {id} did not finish after {} polls",
            self.max_polls
        )))
    }
}

#[async_trait]
impl MediaBackend for ReplicateMedia {
    async fn generate_image(&self, prompt: &str) -> Result<String, TransformError> {
        info!(chars = prompt.len(), "Image generation starting");
        let body = json!({ "input": { "prompt": format!("{prompt}{IMAGE_PROMPT_SUFFIX}") } });
        let prediction = self.create(IMAGE_MODEL_PATH, body).await?;
        let output = self.settle(prediction).await?;
        image_url_from_output(&output)
            .ok_or_else(|| TransformError::EmptyResult("image prediction had no output".into()))
    }

    async fn caption(&self, image_url: &str) -> Result<String, TransformError> {
        info!(image = image_url, "Caption generation starting");
        let body = json!({
            "version": CAPTION_MODEL_VERSION,
            "input": { "image": image_url, "question": CAPTION_QUESTION },
        });
        let prediction = self.create("predictions", body).await?;
        let output = self.settle(prediction).await?;
        caption_from_output(&output)
            .ok_or_else(|| TransformError::EmptyResult("caption prediction had no output".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_from_array_or_string() {
        let output = json!(["https://cdn/x.webp", "https://cdn/y.webp"]);
        assert_eq!(image_url_from_output(&output).as_deref(), Some("https://cdn/x.webp"));
        let output = json!("https://cdn/z.png");
        assert_eq!(image_url_from_output(&output).as_deref(), Some("https://cdn/z.png"));
        assert_eq!(image_url_from_output(&json!([])), None);
        assert_eq!(image_url_from_output(&Value::Null), None);
    }

    #[test]
    fn caption_strips_one_trailing_period() {
        let output = json!("  A corgi running in a grassy field.  ");
        assert_eq!(
            caption_from_output(&output).as_deref(),
            Some("A corgi running in a grassy field")
        );
        assert_eq!(caption_from_output(&json!("Wait...")).as_deref(), Some("Wait.."));
        assert_eq!(caption_from_output(&json!(".")), None);
    }

    #[test]
    fn prediction_states() {
        let p: Prediction =
            serde_json::from_value(json!({"id": "p1", "status": "processing"})).unwrap();
        assert!(matches!(p.state(), PredictionState::Pending));

        let p: Prediction = serde_json::from_value(
            json!({"id": "p1", "status": "failed", "error": "NSFW content detected"}),
        )
        .unwrap();
        assert!(matches!(p.state(), PredictionState::Failed(ref r) if r == "NSFW content detected"));

        let p: Prediction =
            serde_json::from_value(json!({"id": "p1", "status": "canceled"})).unwrap();
        assert!(matches!(p.state(), PredictionState::Failed(ref r) if r == "prediction canceled"));
    }

    #[test]
    fn public_api_requires_token() {
        let config = MediaConfig::default();
        let err = ReplicateMedia::new(reqwest::Client::new(), &config)
            .err()
            .expect("missing token should fail");
        assert!(err.is_fatal());

        let config = MediaConfig {
            base_url: "http://localhost:3000/api/replicate".into(),
            ..MediaConfig::default()
        };
        assert!(ReplicateMedia::new(reqwest::Client::new(), &config).is_ok());
    }
}
