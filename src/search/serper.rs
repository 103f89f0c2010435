//! Serper (Google search API) provider

use super::{SearchError, SearchOutcome, SearchResult, WebSearch, MAX_RESULTS};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEARCH_URL: &str = "https://google.serper.dev/search";

/// Serper search client
pub struct SerperClient {
    client: Client,
    api_key: String,
    url: String,
}

impl SerperClient {
    pub fn new(api_key: String, url: impl Into<String>) -> Result<Self, SearchError> {
        // One connection per call; no retry, no deadline
        let client = Client::builder().pool_max_idle_per_host(0).build()?;
        Ok(Self {
            client,
            api_key,
            url: url.into(),
        })
    }
}

#[async_trait]
impl WebSearch for SerperClient {
    async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let request = SerperRequest {
            q: query,
            limit: MAX_RESULTS,
            page: 1,
        };

        let response = self
            .client
            .post(&self.url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            tracing::warn!(status = %status, "Search provider returned error");
            return Ok(SearchOutcome::Error {
                code: status.as_u16(),
                message: body,
            });
        }

        let parsed: SerperResponse = serde_json::from_str(&body)?;
        let mut results = parsed.organic;
        results.truncate(MAX_RESULTS);

        tracing::debug!(results = results.len(), "Search completed");
        Ok(SearchOutcome::Results(results))
    }
}

// Serper API types

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    limit: usize,
    page: u32,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchResult>,
}
