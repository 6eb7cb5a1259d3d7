use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{NarrativeGenerator, NarrativeRequest};
use crate::config::AppConfig;
use crate::http_client::http_client;

/// OpenAI-compatible `chat/completions` endpoint.
pub struct ChatCompletionsClient {
    client: &'static Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    temperature: f64,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(api_key: String, model: String, base_url: String, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url,
            api_key,
            model,
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .context("OPENAI_API_KEY is not set")?;
        Self::new(
            api_key,
            cfg.model.clone(),
            cfg.base_url.clone(),
            cfg.http_timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl NarrativeGenerator for ChatCompletionsClient {
    #[instrument(skip(self, request), fields(model = %self.model))]
    fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        let payload = ChatPayload {
            model: &self.model,
            temperature: request.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .context("chat completion request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading chat completion body")?;
        if !status.is_success() {
            return Err(anyhow!("http {}: {}", status, body));
        }
        debug!(bytes = body.len(), "chat completion received");
        extract_reply_text(&body)
    }
}

/// Text of the first choice; a missing or null message content is empty text.
pub fn extract_reply_text(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).context("chat completion body is not valid json")?;
    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}
