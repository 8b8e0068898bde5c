//! Client for the `{content, toLevel}` transform proxy.
//!
//! The proxy owns its own prompt table, so only the target level travels on
//! the wire. Each frame's data is `{"content": "<fragment>"}`; payloads that
//! are not JSON are skipped.

use async_trait::async_trait;
use ladder::Level;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::sse::{check_status, fragment_stream};
use super::{BackendRequest, FragmentStream, TextBackend};
use crate::errors::TransformError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequestBody<'a> {
    content: &'a str,
    to_level: Level,
}

#[derive(Debug, Deserialize)]
struct ProxyFrame {
    #[serde(default)]
    content: Option<String>,
}

/// Decode one proxy frame payload.
pub(crate) fn decode_frame(data: &str) -> Result<Option<String>, TransformError> {
    match serde_json::from_str::<ProxyFrame>(data) {
        Ok(frame) => Ok(frame.content.filter(|c| !c.is_empty())),
        Err(e) => {
            warn!(error = %e, data, "Skipping unparseable proxy frame");
            Ok(None)
        }
    }
}

pub struct ProxyBackend {
    client: reqwest::Client,
    url: String,
}

impl ProxyBackend {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TextBackend for ProxyBackend {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn open_stream(&self, request: &BackendRequest<'_>) -> Result<FragmentStream, TransformError> {
        let body = ProxyRequestBody {
            content: request.content,
            to_level: request.to,
        };

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(fragment_stream(response, decode_frame))
    }
}
