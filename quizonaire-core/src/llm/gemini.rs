use super::TextModel;
use crate::config::LlmConfig;
use crate::error::{QuizonaireError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

pub struct GeminiClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Self {
        Self {
            endpoint: format!(
                "{}/{}:generateContent",
                config.gemini_url.trim_end_matches('/'),
                config.gemini_model
            ),
            api_key,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: GenerateResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(QuizonaireError::llm(format!(
                "Gemini error ({}): {}",
                status, error.message
            )));
        }

        first_text(body).ok_or_else(|| QuizonaireError::llm("Gemini returned no text"))
    }
}

fn first_text(body: GenerateResponse) -> Option<String> {
    let candidate = body.candidates.into_iter().next()?;
    let text: String = candidate
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
