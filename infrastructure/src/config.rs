use crate::ollama_client::OllamaClient;
use crate::openai_client::OpenAiClient;
use anyhow::{anyhow, bail};
use domain::completion::CompletionClient;
use domain::memory::RetentionPolicy;
use dotenvy::dotenv;
use shared::types::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Ollama,
    OpenAi,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Backend::Ollama),
            "openai" => Ok(Backend::OpenAi),
            other => Err(anyhow!("unknown LLM backend `{other}` (expected ollama or openai)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub max_output_tokens: Option<u32>,
    pub analysis_max_tokens: u32,
    pub request_timeout: Duration,
    /// `0` keeps every turn in the prompt history.
    pub history_turns: usize,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub form_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Self {
            backend: parse_or(&lookup, "LLM_BACKEND", Backend::Ollama),
            ollama_base_url: get("OLLAMA_BASE_URL", "http://localhost:11434"),
            ollama_model: get("OLLAMA_MODEL", "llama2"),
            openai_base_url: get("OPENAI_BASE_URL", "https://api.openai.com"),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty()),
            openai_model: get("OPENAI_MODEL", "gpt-4o"),
            max_output_tokens: lookup("MAX_OUTPUT_TOKENS").and_then(|raw| match raw.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!(key = "MAX_OUTPUT_TOKENS", value = %raw, "ignoring unparseable setting");
                    None
                }
            }),
            analysis_max_tokens: parse_or(&lookup, "ANALYSIS_MAX_TOKENS", 500),
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 120)),
            history_turns: parse_or(&lookup, "HISTORY_TURNS", 20),
            retry_attempts: parse_or(&lookup, "RETRY_ATTEMPTS", 3),
            retry_backoff: Duration::from_millis(parse_or(&lookup, "RETRY_BACKOFF_MS", 500)),
            form_path: PathBuf::from(get("FORM_PATH", "user_data.json")),
        }
    }

    pub fn model(&self) -> &str {
        match self.backend {
            Backend::Ollama => &self.ollama_model,
            Backend::OpenAi => &self.openai_model,
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        match self.history_turns {
            0 => RetentionPolicy::Unbounded,
            n => RetentionPolicy::LastTurns(n),
        }
    }

    pub fn completion_client(&self) -> Result<Arc<dyn CompletionClient>> {
        let client: Arc<dyn CompletionClient> = match self.backend {
            Backend::Ollama => Arc::new(OllamaClient::new(
                &self.ollama_base_url,
                self.request_timeout,
            )?),
            Backend::OpenAi => {
                let Some(key) = self.openai_api_key.as_deref() else {
                    bail!("OPENAI_API_KEY must be set when LLM_BACKEND=openai");
                };
                Arc::new(OpenAiClient::new(
                    &self.openai_base_url,
                    key,
                    self.request_timeout,
                )?)
            }
        };
        Ok(client)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparseable setting");
            default
        }),
    }
}
