use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vireo_core::error::{Result, VireoError};

use super::Completion;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini `generateContent` client.
pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl Completion for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        user_message: &str,
        temperature: f32,
    ) -> BoxFuture<'_, Result<String>> {
        let model = model.to_string();
        // Gemini has no separate system slot in this endpoint; prepend it.
        let text = if system_prompt.is_empty() {
            user_message.to_string()
        } else {
            format!("{system_prompt}\n\n{user_message}")
        };
        Box::pin(async move {
            let url = format!(
                "{}/models/{}:generateContent?key={}",
                self.base_url, model, self.api_key
            );

            debug!(model = %model, "gemini generateContent");
            let resp = self
                .http
                .post(&url)
                .json(&GenerateRequest {
                    contents: vec![Content {
                        parts: vec![Part { text }],
                    }],
                    generation_config: GenerationConfig { temperature },
                })
                .send()
                .await
                .map_err(|e| VireoError::Upstream(format!("Gemini request failed: {e}")))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(VireoError::Upstream(format!(
                    "Gemini API error {status}: {body}"
                )));
            }

            let body: GenerateResponse = resp.json().await.map_err(|e| {
                VireoError::Upstream(format!("Failed to parse Gemini response: {e}"))
            })?;

            let text = body
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .map(|c| {
                    c.parts
                        .into_iter()
                        .map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();

            Ok(text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let provider = GeminiProvider::new("k", Some("https://example.test/v1/"));
        assert_eq!(provider.base_url, "https://example.test/v1");
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_response_shape_parses() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello"}, {"text": " there"}]}}
            ]
        }"#;
        let resp: GenerateResponse = serde_json::from_str(json).unwrap();
        let text: String = resp.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "Hello there");
    }

    #[test]
    fn test_empty_response_parses() {
        let resp: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.candidates.is_empty());
    }
}
