//! Hosted model abstraction
//!
//! Provides a common streaming interface over text-generation endpoints.

mod error;
mod huggingface;
mod sse;
mod types;

pub use error::LlmError;
#[cfg(test)]
pub use error::LlmErrorKind;
pub use huggingface::{HuggingFaceService, DEFAULT_INFERENCE_URL, DEFAULT_MODEL};
pub use types::*;

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for streaming text generation
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Submit a prompt and open the reply stream.
    ///
    /// An error here means no fragment was produced.
    async fn stream(&self, prompt: &str) -> Result<TokenStream, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: LlmService + ?Sized> LlmService for Arc<T> {
    async fn stream(&self, prompt: &str) -> Result<TokenStream, LlmError> {
        (**self).stream(prompt).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn stream(&self, prompt: &str) -> Result<TokenStream, LlmError> {
        let start = Instant::now();
        let opened = self.inner.stream(prompt).await;

        let inner = match opened {
            Ok(stream) => {
                tracing::debug!(
                    model = %self.model_id,
                    prompt_chars = prompt.chars().count(),
                    "LLM stream opened"
                );
                stream
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "LLM request failed"
                );
                return Err(e);
            }
        };

        let model_id = self.model_id.clone();
        let logged = futures::stream::unfold(
            (inner, 0usize, false),
            move |(mut inner, chunks, failed)| {
                let model_id = model_id.clone();
                async move {
                    if failed {
                        return None;
                    }
                    match inner.next().await {
                        Some(Ok(text)) => Some((Ok(text), (inner, chunks + 1, false))),
                        Some(Err(e)) => {
                            tracing::error!(
                                model = %model_id,
                                duration_ms = %start.elapsed().as_millis(),
                                chunks,
                                error = %e.message,
                                kind = ?e.kind,
                                "LLM stream failed"
                            );
                            Some((Err(e), (inner, chunks, true)))
                        }
                        None => {
                            tracing::info!(
                                model = %model_id,
                                duration_ms = %start.elapsed().as_millis(),
                                chunks,
                                "LLM stream completed"
                            );
                            None
                        }
                    }
                }
            },
        );

        Ok(Box::pin(logged))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
