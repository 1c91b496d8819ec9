use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vireo_core::error::{Result, VireoError};

use super::Completion;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    name: String,
}

impl OpenAiProvider {
    pub fn new(name: &str, api_key: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.map(String::from),
            name: name.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl Completion for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        user_message: &str,
        temperature: f32,
    ) -> BoxFuture<'_, Result<String>> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_message.to_string(),
                },
            ],
            temperature,
        };
        Box::pin(async move {
            let url = format!("{}/chat/completions", self.base_url);

            debug!(model = %request.model, "chat completion request");
            let mut req = self.http.post(&url).json(&request);
            if let Some(ref key) = self.api_key {
                req = req.bearer_auth(key);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| VireoError::Upstream(format!("Chat request failed: {e}")))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(VireoError::Upstream(format!(
                    "Chat API error {status}: {body}"
                )));
            }

            let body: ChatResponse = resp.json().await.map_err(|e| {
                VireoError::Upstream(format!("Failed to parse chat response: {e}"))
            })?;

            Ok(body
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .unwrap_or_default())
        })
    }
}
