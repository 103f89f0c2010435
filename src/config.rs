//! Runtime configuration from the environment

use crate::llm::{DEFAULT_INFERENCE_URL, DEFAULT_MODEL};
use crate::search::DEFAULT_SEARCH_URL;
use std::path::PathBuf;

/// Endpoints and file locations; secrets are resolved separately
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Credential file holding `NAME=value` API keys
    pub env_file: PathBuf,
    pub search_url: String,
    pub model: String,
    /// Base URL the model id is appended to
    pub inference_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from(".env"),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            env_file: get("SEARCH_CHAT_ENV_FILE").map_or(defaults.env_file, PathBuf::from),
            search_url: get("SEARCH_CHAT_SEARCH_URL").unwrap_or(defaults.search_url),
            model: get("SEARCH_CHAT_MODEL").unwrap_or(defaults.model),
            inference_url: get("SEARCH_CHAT_INFERENCE_URL").unwrap_or(defaults.inference_url),
        }
    }
}
