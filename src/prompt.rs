//! Composite prompt assembly
//!
//! Pure functions: the same transcript, prompt and results always produce
//! the same text. The closing condition is an instruction to the hosted
//! model and must keep its meaning if the wording ever changes.

use crate::history::Turn;
use crate::search::SearchResult;

#[cfg(test)]
mod proptests;

pub const CONDITION: &str = "CONDITION: Respond to the user's new prompt based on the search results and the chat history. If there is no useful information in the history or search results, respond directly to the prompt.";

/// Render the transcript as `User: ...` / `AI: ...` lines
pub fn render_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render results as numbered lines, zero-based in provider order
pub fn render_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "RESULT NUMBER {i}: TITLE: {}; LINK: {}; SNIPPET: {}",
                r.title, r.link, r.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the composite prompt for one turn.
///
/// `history` must be the transcript from before this turn's user message.
pub fn compose(history: &[Turn], prompt: &str, results: &[SearchResult]) -> String {
    format!(
        "Chat history (USER and AI): {}\n\nUser's new prompt: {prompt}\n\nSearch results: {}\n\n{CONDITION}",
        render_history(history),
        render_results(results),
    )
}
