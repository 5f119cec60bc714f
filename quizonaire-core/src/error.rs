use crate::gateway::TransactionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuizonaireError>;

#[derive(Error, Debug)]
pub enum QuizonaireError {
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Text model error: {0}")]
    Llm(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Network connection error: {0}")]
    NetworkConnection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Game record not found: {session_id}")]
    RecordNotFound { session_id: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuizonaireError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    pub fn network_connection(msg: impl Into<String>) -> Self {
        Self::NetworkConnection(msg.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }
}

impl From<reqwest::Error> for QuizonaireError {
    fn from(err: reqwest::Error) -> Self {
        QuizonaireError::NetworkConnection(err.to_string())
    }
}
