//! Hugging Face text-generation-inference provider
//!
//! One streaming request per call. The response body is a server-sent event
//! stream whose events carry one generated token each.

use super::sse::SseDecoder;
use super::types::{GenerationParams, TokenStream};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MODEL: &str = "microsoft/Phi-3-mini-4k-instruct";

/// Hugging Face service implementation
pub struct HuggingFaceService {
    client: Client,
    api_key: String,
    url: String,
    model_id: String,
    params: GenerationParams,
}

impl HuggingFaceService {
    pub fn new(
        api_key: String,
        model_id: impl Into<String>,
        base_url: &str,
        params: GenerationParams,
    ) -> Result<Self, LlmError> {
        let model_id = model_id.into();
        let url = format!("{}/{}", base_url.trim_end_matches('/'), model_id);

        // One connection per call, and no deadline on generation
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            url,
            model_id,
            params,
        })
    }
}

#[async_trait]
impl LlmService for HuggingFaceService {
    async fn stream(&self, prompt: &str) -> Result<TokenStream, LlmError> {
        let request = GenerateRequest {
            inputs: prompt,
            parameters: self.params,
            stream: true,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;
            return Err(LlmError::from_status(status, &body));
        }

        Ok(token_stream(Box::pin(response.bytes_stream())))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

struct DecodeState<B> {
    body: B,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    events: usize,
    body_done: bool,
    failed: bool,
}

/// Turn a raw event-stream body into generated text fragments.
///
/// The first error ends the stream; nothing after it is delivered. A body
/// that ends without a single event is an error, not an empty reply.
fn token_stream<B, C, E>(body: B) -> TokenStream
where
    B: Stream<Item = Result<C, E>> + Send + Unpin + 'static,
    C: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        events: 0,
        body_done: false,
        failed: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if state.failed {
                return None;
            }

            if let Some(payload) = state.pending.pop_front() {
                state.events += 1;
                match parse_event(&payload) {
                    Ok(Some(text)) => return Some((Ok(text), state)),
                    Ok(None) => continue,
                    Err(e) => {
                        state.failed = true;
                        return Some((Err(e), state));
                    }
                }
            }

            if state.body_done {
                if state.events == 0 {
                    state.failed = true;
                    let err = LlmError::stream("Response contained no stream events");
                    return Some((Err(err), state));
                }
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.push(chunk.as_ref());
                    state.pending.extend(payloads);
                }
                Some(Err(e)) => {
                    state.failed = true;
                    let err = LlmError::network(format!("Stream interrupted: {e}"));
                    return Some((Err(err), state));
                }
                None => {
                    state.body_done = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    }))
}

/// Extract the token text from one event payload.
///
/// Special tokens (end-of-text markers and the like) carry no visible text.
fn parse_event(payload: &str) -> Result<Option<String>, LlmError> {
    let event: StreamEvent = serde_json::from_str(payload).map_err(|e| {
        LlmError::stream(format!("Malformed stream event: {e} - data: {payload}"))
    })?;

    if let Some(error) = event.error {
        return Err(LlmError::stream(format!("Model endpoint error: {error}")));
    }

    Ok(event.token.filter(|t| !t.special).map(|t| t.text))
}

// Text-generation-inference API types

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParams,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    token: Option<StreamToken>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamToken {
    text: String,
    #[serde(default)]
    special: bool,
}
