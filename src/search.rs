//! Web search abstraction
//!
//! A search either returns ranked results or a provider error placeholder.
//! Callers treat the placeholder as "no context available".

mod serper;

pub use serper::{SerperClient, DEFAULT_SEARCH_URL};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Maximum number of results requested from and kept per query
pub const MAX_RESULTS: usize = 3;

/// One organic search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchResult {
    #[cfg(test)]
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// Result of one search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Provider answered; at most [`MAX_RESULTS`] hits in provider order
    Results(Vec<SearchResult>),
    /// Provider answered with a non-success status
    Error { code: u16, message: String },
}

impl SearchOutcome {
    #[cfg(test)]
    pub fn results(&self) -> &[SearchResult] {
        match self {
            SearchOutcome::Results(results) => results,
            SearchOutcome::Error { .. } => &[],
        }
    }

    /// Results usable as prompt context (none for the error placeholder)
    pub fn into_results(self) -> Vec<SearchResult> {
        match self {
            SearchOutcome::Results(results) => results,
            SearchOutcome::Error { .. } => Vec::new(),
        }
    }
}

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    /// The request never got an HTTP response
    #[error("Search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered 200 with a body we cannot read
    #[error("Malformed search response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Trait for web search providers
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Issue exactly one search request for `query`
    async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError>;
}

#[async_trait]
impl<T: WebSearch + ?Sized> WebSearch for Arc<T> {
    async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        (**self).search(query).await
    }
}
