use super::TextModel;
use crate::config::LlmConfig;
use crate::error::{QuizonaireError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// OpenRouter chat-completions client with model fallback.
pub struct OpenRouterClient {
    url: String,
    api_key: String,
    primary_model: String,
    fallback_models: Vec<String>,
    max_attempts: u32,
    referer: String,
    title: String,
    client: Client,
}

impl OpenRouterClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Self {
        Self {
            url: config.openrouter_url.clone(),
            api_key,
            primary_model: config.openrouter_model.clone(),
            fallback_models: config.fallback_models.clone(),
            max_attempts: config.max_attempts.max(1),
            referer: config.referer.clone(),
            title: config.title.clone(),
            client: Client::new(),
        }
    }

    /// Attempt 0 uses the primary model, attempt `n` the `n`-th fallback,
    /// wrapping to the first fallback once the list is exhausted.
    pub fn model_for_attempt(&self, attempt: u32) -> &str {
        if attempt == 0 || self.fallback_models.is_empty() {
            return &self.primary_model;
        }
        let index = (attempt - 1) as usize;
        self.fallback_models
            .get(index)
            .unwrap_or(&self.fallback_models[0])
    }

    async fn request(&self, model: &str, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: ChatResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(QuizonaireError::llm(format!(
                "OpenRouter error ({}): {}",
                status, error.message
            )));
        }

        extract_content(body)
            .ok_or_else(|| QuizonaireError::llm("OpenRouter returned empty content"))
    }
}

fn extract_content(body: ChatResponse) -> Option<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
}

#[async_trait]
impl TextModel for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0;

        loop {
            let model = self.model_for_attempt(attempt);
            tracing::debug!(
                "OpenRouter request with model {}, attempt {}",
                model,
                attempt + 1
            );

            match self.request(model, prompt).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt + 1 < self.max_attempts => {
                    tracing::warn!("OpenRouter attempt {} failed: {}", attempt + 1, e);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(QuizonaireError::llm(format!(
                        "Failed after {} attempts. Last error: {}",
                        self.max_attempts, e
                    )));
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenRouterClient {
        OpenRouterClient::new(&LlmConfig::default(), "key".to_string())
    }

    #[test]
    fn test_model_rotation() {
        let client = client();
        assert_eq!(client.model_for_attempt(0), "qwen/qwen3-coder:free");
        assert_eq!(client.model_for_attempt(1), "qwen/qwen3-32b");
        assert_eq!(client.model_for_attempt(2), "nousresearch/hermes-4-70b");
        assert_eq!(client.model_for_attempt(3), "google/gemini-2.5-pro");
        assert_eq!(client.model_for_attempt(4), "qwen/qwen3-32b");
    }

    #[test]
    fn test_extract_content() {
        let body: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "[]" } }]
        }))
        .unwrap();
        assert_eq!(extract_content(body).as_deref(), Some("[]"));

        let empty: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "  " } }]
        }))
        .unwrap();
        assert!(extract_content(empty).is_none());

        let none: ChatResponse = serde_json::from_value(json!({})).unwrap();
        assert!(extract_content(none).is_none());
    }
}
