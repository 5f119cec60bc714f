use crate::error::{QuizonaireError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    pub network: NetworkConfig,
    pub contract_address: String,
    /// Sending account; resolved from the node when unset.
    pub account: Option<String>,
    pub base_price: f64,
    pub win_multiplier: f64,
    pub question_count: usize,
    pub min_question_secs: u32,
    pub persona: String,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub chain_name: String,
    pub currency_symbol: String,
    pub receipt_poll_interval: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub openrouter_url: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub fallback_models: Vec<String>,
    pub max_attempts: u32,
    pub referer: String,
    pub title: String,
    pub gemini_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://forno.celo-sepolia.celo-testnet.org".to_string(),
            chain_id: 11_142_220,
            chain_name: "Celo Sepolia Testnet".to_string(),
            currency_symbol: "CELO".to_string(),
            receipt_poll_interval: Duration::from_secs(2),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openrouter_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            openrouter_api_key: None,
            openrouter_model: "qwen/qwen3-coder:free".to_string(),
            fallback_models: vec![
                "qwen/qwen3-32b".to_string(),
                "nousresearch/hermes-4-70b".to_string(),
                "google/gemini-2.5-pro".to_string(),
            ],
            max_attempts: 5,
            referer: "https://quizonaire.vercel.app".to_string(),
            title: "Quizonaire".to_string(),
            gemini_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            contract_address: String::new(),
            account: None,
            base_price: 0.00001,
            win_multiplier: 1.5,
            question_count: 10,
            min_question_secs: 15,
            persona: "human".to_string(),
            llm: LlmConfig::default(),
        }
    }
}

impl QuizConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("QUIZONAIRE_RPC_URL") {
            config.network.rpc_url = url;
        }
        if let Some(chain_id) = get("QUIZONAIRE_CHAIN_ID") {
            config.network.chain_id = chain_id.trim().parse().map_err(|e| {
                QuizonaireError::config(format!("QUIZONAIRE_CHAIN_ID is not a number: {}", e))
            })?;
        }
        if let Some(address) = get("CONTRACT_QUIZ_ADDRESS") {
            config.contract_address = address;
        }
        if let Some(account) = get("QUIZONAIRE_ACCOUNT") {
            config.account = Some(account);
        }
        if let Some(price) = get("QUIZONAIRE_BASE_PRICE") {
            config.base_price = price.trim().parse().map_err(|e| {
                QuizonaireError::config(format!("QUIZONAIRE_BASE_PRICE is not a number: {}", e))
            })?;
        }
        if let Some(key) = get("OPENROUTER_API_KEY") {
            config.llm.openrouter_api_key = Some(key);
        }
        if let Some(model) = get("OPENROUTER_MODEL") {
            config.llm.openrouter_model = model;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            config.llm.gemini_api_key = Some(key);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.network.rpc_url.is_empty() {
            return Err(QuizonaireError::config("RPC URL cannot be empty"));
        }

        if !(self.base_price.is_finite() && self.base_price > 0.0) {
            return Err(QuizonaireError::config("Base price must be greater than 0"));
        }

        if !(self.win_multiplier.is_finite() && self.win_multiplier >= 0.0) {
            return Err(QuizonaireError::config("Win multiplier must not be negative"));
        }

        if self.question_count == 0 {
            return Err(QuizonaireError::config("Question count must be greater than 0"));
        }

        if self.llm.max_attempts == 0 {
            return Err(QuizonaireError::config("LLM attempts must be greater than 0"));
        }

        Ok(())
    }

    /// Checks only needed when talking to a real contract.
    pub fn validate_ledger(&self) -> Result<()> {
        self.validate()?;

        if !is_hex_address(&self.contract_address) {
            return Err(QuizonaireError::config(format!(
                "Contract address is not a valid address: '{}'",
                self.contract_address
            )));
        }

        if let Some(account) = &self.account {
            if !is_hex_address(account) {
                return Err(QuizonaireError::config(format!(
                    "Account is not a valid address: '{}'",
                    account
                )));
            }
        }

        Ok(())
    }
}

pub fn is_hex_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map_or(false, |hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
