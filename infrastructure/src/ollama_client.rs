use crate::http::{send_error, status_error};
use async_trait::async_trait;
use domain::completion::{CompletionClient, CompletionRequest};
use domain::error::CompletionError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::types::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct Options {
    num_predict: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Options>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Message,
    #[serde(default)]
    done: bool,
}

/// Client for a local Ollama server's `/api/chat` endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    client: Arc<Client>,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Joins the `message.content` of every NDJSON chunk up to `done`. A
    /// non-streamed reply is a single chunk.
    fn collect_content(text: &str) -> Option<String> {
        let mut full_content = String::new();
        let mut parsed_any = false;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(chat_resp) = serde_json::from_str::<ChatResponse>(line) {
                parsed_any = true;
                full_content.push_str(&chat_resp.message.content);
                if chat_resp.done {
                    break;
                }
            }
        }
        parsed_any.then_some(full_content)
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: &request.model,
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            stream: false,
            options: request.max_tokens.map(|num_predict| Options { num_predict }),
        };
        debug!(%url, model = %request.model, prompt_chars = request.prompt.len(), "ollama request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| send_error("ollama", err))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| send_error("ollama", err))?;
        if !status.is_success() {
            return Err(status_error("ollama", status, &text));
        }

        Self::collect_content(&text)
            .ok_or_else(|| CompletionError::Model("ollama returned an unreadable response".into()))
    }

    fn backend(&self) -> &str {
        "ollama"
    }
}
