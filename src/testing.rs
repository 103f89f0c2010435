//! Mock implementations for testing
//!
//! These mocks let the engine and session run without network access.

use crate::llm::{LlmError, LlmService, TokenStream};
use crate::search::{SearchError, SearchOutcome, SearchResult, WebSearch};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Search
// ============================================================================

/// Mock search provider that returns queued outcomes
pub struct MockSearch {
    outcomes: Mutex<VecDeque<Result<SearchOutcome, SearchError>>>,
    /// Record of all queries made
    pub queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful search
    pub fn queue_results(&self, results: Vec<SearchResult>) {
        self.queue(Ok(SearchOutcome::Results(results)));
    }

    /// Queue any outcome or error
    pub fn queue(&self, outcome: Result<SearchOutcome, SearchError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        // Unscripted queries behave like a search with no hits
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SearchOutcome::Results(vec![])))
    }
}

/// A genuine transport timeout from reqwest, for search failure scenarios
pub async fn search_timeout_error() -> SearchError {
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(20))
        .build()
        .unwrap();
    let err = client.post(server.uri()).send().await.unwrap_err();
    assert!(err.is_timeout());
    SearchError::Transport(err)
}

// ============================================================================
// Mock LLM
// ============================================================================

enum ScriptedStream {
    Chunks(Vec<String>),
    FailAfter(Vec<String>, LlmError),
    OpenError(LlmError),
}

/// Mock LLM that replays queued chunk sequences
pub struct MockLlm {
    scripts: Mutex<VecDeque<ScriptedStream>>,
    model_id: String,
    /// Record of all prompts submitted
    pub prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a stream that yields `chunks` and completes
    pub fn queue_chunks<const N: usize>(&self, chunks: [&str; N]) {
        self.push(ScriptedStream::Chunks(to_strings(&chunks)));
    }

    /// Queue a stream that yields `chunks` and then fails
    pub fn queue_failing_stream<const N: usize>(&self, chunks: [&str; N], error: LlmError) {
        self.push(ScriptedStream::FailAfter(to_strings(&chunks), error));
    }

    /// Queue a request that fails before any chunk is produced
    pub fn queue_open_error(&self, error: LlmError) {
        self.push(ScriptedStream::OpenError(error));
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn push(&self, script: ScriptedStream) {
        self.scripts.lock().unwrap().push_back(script);
    }
}

fn to_strings(chunks: &[&str]) -> Vec<String> {
    chunks.iter().map(ToString::to_string).collect()
}

#[async_trait]
impl LlmService for MockLlm {
    async fn stream(&self, prompt: &str) -> Result<TokenStream, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let script = self.scripts.lock().unwrap().pop_front();

        let items: Vec<Result<String, LlmError>> = match script {
            Some(ScriptedStream::Chunks(chunks)) => chunks.into_iter().map(Ok).collect(),
            Some(ScriptedStream::FailAfter(chunks, error)) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(error)))
                .collect(),
            Some(ScriptedStream::OpenError(error)) => return Err(error),
            None => return Err(LlmError::network("No mock stream queued")),
        };

        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_mock_llm_replays_in_order() {
        let mock = MockLlm::new("test-model");
        mock.queue_chunks(["a", "b"]);

        let chunks: Vec<_> = mock.stream("p").await.unwrap().collect().await;
        assert_eq!(chunks.len(), 2);

        // Second call fails: nothing queued
        assert!(mock.stream("p").await.is_err());
        assert_eq!(mock.recorded_prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_search_defaults_to_no_results() {
        let search = MockSearch::new();
        let outcome = search.search("q").await.unwrap();
        assert!(outcome.results().is_empty());
        assert_eq!(search.recorded_queries(), vec!["q".to_string()]);
    }
}
