//! Streaming Transform Engine.
//!
//! One call converts source text from one level to an adjacent one:
//!
//! ```text
//! instruction(to) → backend.open_stream → for each fragment:
//!     append to full response + flush buffer
//!     policy(to) says flush? → on_partial(full response)
//! end of stream → residual flush → return full response
//! ```
//!
//! `on_partial` always receives the whole response so far, so every value is
//! a prefix-extension of the previous one. It runs inline, before the next
//! fragment is read. The engine holds nothing between calls.

use std::sync::Arc;

use futures::StreamExt;
use ladder::{FlushBuffer, Level};
use tracing::{error, info};

use crate::backend::{BackendRequest, TextBackend};
use crate::errors::TransformError;
use crate::prompts;

/// Outcome of one successful transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformReport {
    pub text: String,
    /// Non-empty fragments received.
    pub fragments: usize,
    /// `on_partial` invocations.
    pub flushes: usize,
}

pub struct TransformEngine {
    backend: Arc<dyn TextBackend>,
}

impl TransformEngine {
    pub fn new(backend: Arc<dyn TextBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Transform `source` from `from` to `to`, reporting partials as they flush.
    pub async fn transform(
        &self,
        source: &str,
        from: Level,
        to: Level,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, TransformError> {
        self.transform_with_report(source, from, to, on_partial)
            .await
            .map(|report| report.text)
    }

    /// Like `transform`, also returning fragment and flush counts.
    pub async fn transform_with_report(
        &self,
        source: &str,
        from: Level,
        to: Level,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<TransformReport, TransformError> {
        let result = self.run(source, from, to, on_partial).await;
        match &result {
            Ok(report) => info!(
                backend = self.backend.name(),
                from = %from,
                to = %to,
                chars = report.text.chars().count(),
                fragments = report.fragments,
                flushes = report.flushes,
                "Transform complete"
            ),
            Err(e) => error!(
                backend = self.backend.name(),
                from = %from,
                to = %to,
                error = %e,
                "Transform failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        source: &str,
        from: Level,
        to: Level,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<TransformReport, TransformError> {
        let instruction = prompts::instruction(to).ok_or_else(|| {
            TransformError::Configuration(format!("no text instruction for level '{to}'"))
        })?;

        info!(backend = self.backend.name(), from = %from, to = %to, "Transform starting");

        let request = BackendRequest {
            content: source,
            from,
            to,
            instruction,
        };
        let mut fragments = self.backend.open_stream(&request).await?;
        let mut buffer = FlushBuffer::new(to.flush_policy());

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            if let Some(full) = buffer.push(&fragment) {
                on_partial(full);
            }
        }

        // Guarantees the caller sees the final text even without a terminator.
        if let Some(full) = buffer.finish() {
            on_partial(full);
        }

        if buffer.full().trim().is_empty() {
            return Err(TransformError::EmptyResult(format!(
                "backend produced no text for {from} → {to}"
            )));
        }

        Ok(TransformReport {
            fragments: buffer.fragments(),
            flushes: buffer.flushes(),
            text: buffer.into_text(),
        })
    }
}
