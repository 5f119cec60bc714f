//! Text-generation clients used to write quiz content.

pub mod canned;
pub mod gemini;
pub mod openrouter;

pub use canned::CannedModel;
pub use gemini::GeminiClient;
pub use openrouter::OpenRouterClient;

use crate::config::LlmConfig;
use crate::error::{QuizonaireError, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait TextModel: Send + Sync {
    fn name(&self) -> &str;

    /// Send a single user prompt and return the raw text answer.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Tries each model in order until one returns non-empty content.
pub struct ModelChain {
    models: Vec<Arc<dyn TextModel>>,
}

impl ModelChain {
    pub fn new(models: Vec<Arc<dyn TextModel>>) -> Self {
        Self { models }
    }

    /// Gemini first when a key is configured, then OpenRouter.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let mut models: Vec<Arc<dyn TextModel>> = Vec::new();

        if let Some(key) = &config.gemini_api_key {
            models.push(Arc::new(GeminiClient::new(config, key.clone())));
        }
        if let Some(key) = &config.openrouter_api_key {
            models.push(Arc::new(OpenRouterClient::new(config, key.clone())));
        }

        if models.is_empty() {
            return Err(QuizonaireError::config(
                "No API key configured. Set GEMINI_API_KEY or OPENROUTER_API_KEY",
            ));
        }

        Ok(Self::new(models))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[async_trait]
impl TextModel for ModelChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut last_error = None;

        for model in &self.models {
            match model.complete(prompt).await {
                Ok(content) if !content.trim().is_empty() => {
                    tracing::info!("{} request successful", model.name());
                    return Ok(content);
                }
                Ok(_) => {
                    tracing::warn!("{} returned empty content, trying next model", model.name());
                    last_error = Some(QuizonaireError::llm(format!(
                        "{} returned empty content",
                        model.name()
                    )));
                }
                Err(e) => {
                    tracing::warn!("{} failed, trying next model: {}", model.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| QuizonaireError::llm("no text models configured")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingModel;

    #[async_trait]
    impl TextModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(QuizonaireError::network_connection("unreachable"))
        }
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_next_model() {
        let chain = ModelChain::new(vec![
            Arc::new(FailingModel),
            Arc::new(CannedModel::new("")),
            Arc::new(CannedModel::new("[1]")),
        ]);

        assert_eq!(chain.complete("prompt").await.unwrap(), "[1]");
    }

    #[tokio::test]
    async fn test_chain_reports_last_error() {
        let chain = ModelChain::new(vec![Arc::new(FailingModel)]);
        let err = chain.complete("prompt").await.unwrap_err();
        assert!(matches!(err, QuizonaireError::NetworkConnection(_)));

        let empty = ModelChain::new(Vec::new());
        assert!(empty.complete("prompt").await.is_err());
    }

    #[test]
    fn test_chain_requires_a_key() {
        assert!(ModelChain::from_config(&LlmConfig::default()).is_err());

        let config = LlmConfig {
            gemini_api_key: Some("g".into()),
            openrouter_api_key: Some("o".into()),
            ..LlmConfig::default()
        };
        let chain = ModelChain::from_config(&config).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.models[0].name(), "gemini");
    }
}
