//! API key resolution
//!
//! Keys come from the process environment first, then from a local
//! `NAME=value` file loaded at startup, and finally from a hidden
//! interactive prompt. A prompted key is written back to both the
//! environment and the file so later runs skip the prompt.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the search provider key
pub const SEARCH_API_KEY_VAR: &str = "SAPER_API_KEY";
/// Environment variable holding the model provider key
pub const MODEL_API_KEY_VAR: &str = "HUGGINGFACEHUB_API_KEY";

/// A resolved secret
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    name: String,
    value: String,
}

impl Credential {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_value(self) -> String {
        self.value
    }
}

// Never print the secret itself
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential variable name is empty")]
    EmptyName,

    #[error("{0} is not set and no terminal is available to prompt for it")]
    NonInteractive(String),

    #[error("failed to read {name} from the terminal: {source}")]
    Prompt {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to save {name} to {}: {source}", .path.display())]
    Persist {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load credential file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Interactive surface used when a key is missing
pub trait SecretPrompt {
    /// Whether an operator can answer a prompt
    fn is_interactive(&self) -> bool;

    /// Ask for a secret without echoing it
    fn read_secret(&self, label: &str) -> io::Result<String>;
}

/// Hidden-input prompt on the controlling terminal
pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn read_secret(&self, label: &str) -> io::Result<String> {
        dialoguer::Password::new()
            .with_prompt(label)
            .interact()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Resolves named API keys
pub struct CredentialStore<P> {
    env_file: PathBuf,
    prompt: P,
}

impl<P: SecretPrompt> CredentialStore<P> {
    /// Load `env_file` into the environment and build the store.
    ///
    /// Variables already present in the environment are not overridden.
    /// A missing file is fine; it is created on the first prompted key.
    pub fn open(env_file: impl Into<PathBuf>, prompt: P) -> Result<Self, CredentialError> {
        let env_file = env_file.into();
        match dotenvy::from_path(&env_file) {
            Ok(()) => tracing::debug!(path = %env_file.display(), "Loaded credential file"),
            Err(e) if e.not_found() => {
                tracing::debug!(path = %env_file.display(), "No credential file yet");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Self { env_file, prompt })
    }

    /// Resolve `name`, prompting only when neither the environment nor
    /// the credential file provides a non-empty value
    pub fn resolve(&self, name: &str) -> Result<Credential, CredentialError> {
        if name.is_empty() {
            return Err(CredentialError::EmptyName);
        }

        if let Some(value) = std::env::var(name).ok().filter(|v| !v.is_empty()) {
            return Ok(Credential {
                name: name.to_string(),
                value,
            });
        }

        if !self.prompt.is_interactive() {
            return Err(CredentialError::NonInteractive(name.to_string()));
        }

        let label = format!("Enter {}", name.split('_').collect::<Vec<_>>().join(" "));
        let value = loop {
            let answer = self
                .prompt
                .read_secret(&label)
                .map_err(|source| CredentialError::Prompt {
                    name: name.to_string(),
                    source,
                })?;
            if !answer.is_empty() {
                break answer;
            }
        };

        std::env::set_var(name, &value);
        upsert_entry(&self.env_file, name, &value).map_err(|source| {
            CredentialError::Persist {
                name: name.to_string(),
                path: self.env_file.clone(),
                source,
            }
        })?;
        tracing::info!(name, path = %self.env_file.display(), "Saved credential");

        Ok(Credential {
            name: name.to_string(),
            value,
        })
    }
}

/// The two keys a session needs
#[derive(Debug)]
pub struct ApiKeys {
    pub search: Credential,
    pub model: Credential,
}

/// Resolve both provider keys.
///
/// May block on the terminal and writes the process environment, so call it
/// before any async runtime threads exist.
pub fn resolve_api_keys<P: SecretPrompt>(
    store: &CredentialStore<P>,
) -> Result<ApiKeys, CredentialError> {
    Ok(ApiKeys {
        search: store.resolve(SEARCH_API_KEY_VAR)?,
        model: store.resolve(MODEL_API_KEY_VAR)?,
    })
}

/// Replace every `name=` line in the file, or append one
fn upsert_entry(path: &Path, name: &str, value: &str) -> io::Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let entry = format!("{name}={}", quote_value(value));
    let mut replaced = false;
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            if entry_key(line) == Some(name) {
                replaced = true;
                entry.clone()
            } else {
                line.to_string()
            }
        })
        .collect();
    if !replaced {
        lines.push(entry);
    }

    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(path, contents)
}

fn entry_key(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, _) = line.split_once('=')?;
    Some(key.trim())
}

/// Quote so the file reads back verbatim, without variable expansion
fn quote_value(value: &str) -> String {
    if value.contains('\'') {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$");
        format!("\"{escaped}\"")
    } else {
        format!("'{value}'")
    }
}
