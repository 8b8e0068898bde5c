//! Text-generation backends.
//!
//! A backend turns one transform request into a stream of text fragments in
//! generation order. It does no buffering of its own; the engine decides when
//! accumulated text is surfaced.
//!
//! | Backend        | Protocol                                              |
//! |----------------|-------------------------------------------------------|
//! | `ProxyBackend` | `POST {content, toLevel}` → `data: {"content"}` frames |
//! | `OpenAiBackend`| OpenAI-compatible `/chat/completions` with `stream`    |

pub mod openai;
pub mod proxy;
pub mod sse;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use ladder::Level;

use crate::config::{BackendKind, PinchConfig};
use crate::errors::TransformError;

pub use openai::OpenAiBackend;
pub use proxy::ProxyBackend;

/// Fragments in arrival order; finite, single-consumption.
pub type FragmentStream = BoxStream<'static, Result<String, TransformError>>;

/// One transformation request as seen by a backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendRequest<'a> {
    pub content: &'a str,
    pub from: Level,
    pub to: Level,
    /// Level-specific directive chosen by the engine.
    pub instruction: &'static str,
}

#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Backend name for logging (e.g. `"proxy"`, `"openai"`).
    fn name(&self) -> &'static str;

    /// Issue the request and return its fragment stream.
    ///
    /// # Errors
    ///
    /// `Http` for a non-success status, `Transport` if the request could not
    /// be sent. Errors during streaming arrive as stream items.
    async fn open_stream(&self, request: &BackendRequest<'_>) -> Result<FragmentStream, TransformError>;
}

/// Build the backend selected by `config`, sharing `client`.
///
/// # Errors
///
/// `Configuration` if the selected backend lacks a credential.
pub fn from_config(
    config: &PinchConfig,
    client: reqwest::Client,
) -> Result<Arc<dyn TextBackend>, TransformError> {
    match config.backend {
        BackendKind::Proxy => Ok(Arc::new(ProxyBackend::new(client, &config.proxy.url))),
        BackendKind::OpenAi => Ok(Arc::new(OpenAiBackend::new(client, &config.openai)?)),
    }
}
