//! Search Chat - web-grounded conversational agent
//!
//! Reads prompts from the terminal, augments each with live web search
//! results and the conversation so far, and streams a hosted model's reply.

mod config;
mod credentials;
mod engine;
mod history;
mod llm;
mod prompt;
mod search;
mod session;

#[cfg(test)]
mod testing;

use config::AppConfig;
use credentials::{resolve_api_keys, CredentialStore, TerminalPrompt};
use engine::ConversationEngine;
use llm::{GenerationParams, HuggingFaceService, LoggingService};
use search::SerperClient;
use session::SessionLoop;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "search_chat=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::from_env();

    // Keys are resolved on the main thread before the runtime starts.
    // Missing keys are fatal when nobody can be prompted.
    let credentials = CredentialStore::open(&config.env_file, TerminalPrompt)?;
    let keys = resolve_api_keys(&credentials)?;
    tracing::debug!(
        search = keys.search.name(),
        model = keys.model.name(),
        "Credentials resolved"
    );

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config, keys.search.into_value(), keys.model.into_value()))
}

async fn run(
    config: AppConfig,
    search_key: String,
    model_key: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let search = SerperClient::new(search_key, config.search_url.as_str())?;
    let model = HuggingFaceService::new(
        model_key,
        config.model.as_str(),
        &config.inference_url,
        GenerationParams::default(),
    )?;
    let llm = LoggingService::new(Arc::new(model));

    tracing::info!(
        model = %config.model,
        search_url = %config.search_url,
        "Session starting"
    );

    let mut session = SessionLoop::new(ConversationEngine::new(search, llm));
    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();

    tokio::select! {
        result = session.run(input, &mut output) => result?,
        _ = tokio::signal::ctrl_c() => {
            let engine = session.engine();
            tracing::info!(
                turns = engine.history().len(),
                phase = %engine.phase(),
                "Interrupted"
            );
        }
    }

    Ok(())
}
