//! The seam between navigation and content generation.
//!
//! The navigator only knows `Transformer`. `TransformEngine` serves text-only
//! ladders; `LadderTransformer` adds the image level by routing moves into or
//! out of `Image` to a media backend.

use std::sync::Arc;

use async_trait::async_trait;
use ladder::Level;

use crate::engine::TransformEngine;
use crate::errors::TransformError;
use crate::media::MediaBackend;

#[async_trait]
pub trait Transformer: Send + Sync {
    /// Convert `source` at `from` into the adjacent level `to`.
    ///
    /// `on_partial` receives growing prefixes of the result while it is being
    /// produced; the returned string is the final value.
    async fn transform(
        &self,
        source: &str,
        from: Level,
        to: Level,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, TransformError>;
}

#[async_trait]
impl Transformer for TransformEngine {
    async fn transform(
        &self,
        source: &str,
        from: Level,
        to: Level,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, TransformError> {
        TransformEngine::transform(self, source, from, to, on_partial).await
    }
}

/// Text levels through the engine, `Image` through the media backend.
pub struct LadderTransformer {
    engine: TransformEngine,
    media: Option<Arc<dyn MediaBackend>>,
}

impl LadderTransformer {
    pub fn new(engine: TransformEngine) -> Self {
        Self {
            engine,
            media: None,
        }
    }

    pub fn with_media(mut self, media: Arc<dyn MediaBackend>) -> Self {
        self.media = Some(media);
        self
    }

    fn media(&self) -> Result<&dyn MediaBackend, TransformError> {
        self.media.as_deref().ok_or_else(|| {
            TransformError::Configuration("image level requires a media backend".to_string())
        })
    }
}

#[async_trait]
impl Transformer for LadderTransformer {
    async fn transform(
        &self,
        source: &str,
        from: Level,
        to: Level,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, TransformError> {
        let result = if to == Level::Image {
            self.media()?.generate_image(source).await?
        } else if from == Level::Image {
            self.media()?.caption(source).await?
        } else {
            return self.engine.transform(source, from, to, on_partial).await;
        };
        // Media results arrive whole: one partial, equal to the final value.
        on_partial(&result);
        Ok(result)
    }
}
