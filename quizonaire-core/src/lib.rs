//! Quizonaire SDK - core library for the staked quiz game
//!
//! This crate holds everything the quiz game talks to: the quiz contract
//! gateway, the text-generation clients that write questions, ledger amounts,
//! configuration, and the local game history.

pub mod config;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod storage;
pub mod units;

pub use config::{LlmConfig, NetworkConfig, QuizConfig};
pub use error::{QuizonaireError, Result};
pub use gateway::{
    ContractGateway, MemoryGateway, RpcGateway, TransactionError, TxReceipt, TxResult,
};
pub use llm::{CannedModel, GeminiClient, ModelChain, OpenRouterClient, TextModel};
pub use storage::{GameOutcome, GameRecord, HistoryStore, HistorySummary, Storage};
pub use units::Wei;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_storage_creation() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(&temp_dir.path().join("nested").join("quizonaire.db"))
            .await
            .unwrap();

        let summary = HistoryStore::new(&storage).summary().await.unwrap();
        assert_eq!(summary.games_played, 0);
    }
}
