//! One conversational turn: search, compose, stream, commit
//!
//! A turn walks `Idle` -> `SearchPending` -> `Composing` -> `Streaming` ->
//! `Committing` -> `Idle`. Search problems degrade to an empty context;
//! model problems abort the turn without committing agent text.

use crate::history::ConversationHistory;
use crate::llm::{LlmError, LlmService};
use crate::prompt;
use crate::search::{SearchError, SearchOutcome, SearchResult, WebSearch};
use futures::StreamExt;
use std::fmt;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Marker written before each streamed reply
pub const REPLY_MARKER: &str = "\nAI: \n";

/// Where the engine is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    SearchPending,
    Composing,
    Streaming,
    Committing,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::Idle => "idle",
            TurnPhase::SearchPending => "search_pending",
            TurnPhase::Composing => "composing",
            TurnPhase::Streaming => "streaming",
            TurnPhase::Committing => "committing",
        };
        f.write_str(name)
    }
}

/// Why a turn failed
#[derive(Debug, Error)]
pub enum TurnError {
    /// Only malformed provider responses; transport failures degrade
    #[error("{0}")]
    Search(SearchError),

    #[error("model request failed: {0}")]
    Model(#[from] LlmError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Orchestrates turns against injected search and model services
pub struct ConversationEngine<S, L> {
    search: S,
    llm: L,
    history: ConversationHistory,
    phase: TurnPhase,
}

impl<S: WebSearch, L: LlmService> ConversationEngine<S, L> {
    pub fn new(search: S, llm: L) -> Self {
        Self {
            search,
            llm,
            history: ConversationHistory::new(),
            phase: TurnPhase::Idle,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Run one turn, streaming the reply into `out` as it arrives.
    ///
    /// Returns the committed reply. The user turn is recorded once the
    /// prompt is composed, even if the model call later fails; the agent
    /// turn is recorded only for a stream that completed.
    pub async fn run_turn<W>(&mut self, prompt_text: &str, out: &mut W) -> Result<String, TurnError>
    where
        W: AsyncWrite + Unpin,
    {
        let result = self.drive_turn(prompt_text, out).await;
        if let Err(e) = &result {
            tracing::warn!(phase = %self.phase, error = %e, "Turn aborted");
        }
        self.enter(TurnPhase::Idle);
        result
    }

    async fn drive_turn<W>(&mut self, prompt_text: &str, out: &mut W) -> Result<String, TurnError>
    where
        W: AsyncWrite + Unpin,
    {
        self.enter(TurnPhase::SearchPending);
        let results = self.search_context(prompt_text).await?;

        self.enter(TurnPhase::Composing);
        let composite = prompt::compose(self.history.all_turns(), prompt_text, &results);
        self.history.add_user(prompt_text);

        self.enter(TurnPhase::Streaming);
        out.write_all(REPLY_MARKER.as_bytes()).await?;
        out.flush().await?;

        let mut stream = self.llm.stream(&composite).await?;
        let mut reply = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(chunk.as_bytes()).await?;
            out.flush().await?;
            reply.push_str(&chunk);
        }

        self.enter(TurnPhase::Committing);
        self.history.add_agent(reply.clone());
        Ok(reply)
    }

    /// Search for context; anything but a malformed response degrades to no results
    async fn search_context(&self, query: &str) -> Result<Vec<SearchResult>, TurnError> {
        match self.search.search(query).await {
            Ok(outcome) => {
                if let SearchOutcome::Error { code, message } = &outcome {
                    tracing::warn!(code, message = %message, "Search provider error, continuing without context");
                }
                Ok(outcome.into_results())
            }
            Err(SearchError::Transport(e)) => {
                tracing::warn!(error = %e, "Search request failed, continuing without context");
                Ok(Vec::new())
            }
            Err(e @ SearchError::Malformed(_)) => Err(TurnError::Search(e)),
        }
    }

    fn enter(&mut self, phase: TurnPhase) {
        tracing::debug!(from = %self.phase, to = %phase, "Turn phase");
        self.phase = phase;
    }
}
