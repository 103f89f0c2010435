//! Common types for text generation

use super::LlmError;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;

/// Ordered, finite sequence of generated text fragments.
///
/// Each fragment is delivered exactly once; the stream cannot be restarted.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Sampling parameters sent with every generation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub do_sample: bool,
    pub repetition_penalty: f32,
    pub return_full_text: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 100,
            do_sample: true,
            repetition_penalty: 1.03,
            return_full_text: false,
        }
    }
}
