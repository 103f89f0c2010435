//! Read-prompt / run-turn loop
//!
//! Input and output are injected so scripted sessions can drive the
//! engine without a console.

use crate::engine::{ConversationEngine, TurnError};
use crate::llm::LlmService;
use crate::search::WebSearch;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Prompt marker written before each read
pub const INPUT_MARKER: &str = "\nEnter your prompt: ";

/// Drives one conversation until input ends
pub struct SessionLoop<S, L> {
    engine: ConversationEngine<S, L>,
}

impl<S: WebSearch, L: LlmService> SessionLoop<S, L> {
    pub fn new(engine: ConversationEngine<S, L>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ConversationEngine<S, L> {
        &self.engine
    }

    /// Run turns one at a time until `input` is exhausted.
    ///
    /// A failed turn is reported on `output` and the loop moves on. Only a
    /// broken input or output channel ends the session with an error.
    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut turns = 0usize;

        loop {
            output.write_all(INPUT_MARKER.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match self.engine.run_turn(&line, output).await {
                Ok(_) => turns += 1,
                Err(TurnError::Output(e)) => return Err(e),
                Err(e) => {
                    output.write_all(format!("\n[error] {e}").as_bytes()).await?;
                    output.flush().await?;
                }
            }
        }

        tracing::info!(turns, "Session input ended");
        Ok(())
    }
}
