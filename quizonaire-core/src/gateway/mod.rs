//! Quiz contract gateway.
//!
//! The quiz contract is an external collaborator with a fixed ABI. Everything
//! that touches it goes through [`ContractGateway`], so the game state machine
//! never deals with RPC details.

pub mod abi;
pub mod memory;
pub mod rpc;

pub use memory::{GatewayCall, MemoryGateway};
pub use rpc::RpcGateway;

use crate::units::Wei;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type TxResult<T> = std::result::Result<T, TransactionError>;

/// JSON-RPC code wallets use when the user declines to sign.
pub const USER_REJECTED_CODE: i64 = 4001;
/// JSON-RPC internal error, usually a flaky node.
pub const INTERNAL_RPC_CODE: i64 = -32603;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Transaction rejected by user")]
    UserRejected,

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transaction reverted: {reason}")]
    Reverted {
        tx_hash: Option<String>,
        reason: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Wrong network: expected chain {expected}, connected to {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Gateway is not connected")]
    NotConnected,

    #[error("Account {account} is not the contract owner")]
    NotOwner { account: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Sent, but the receipt could not be read. The transaction may still be mined.
    #[error("Transaction {tx_hash} was sent but its outcome is unknown: {reason}")]
    Unconfirmed { tx_hash: String, reason: String },
}

impl TransactionError {
    /// Classify an error object returned by the node or wallet.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == USER_REJECTED_CODE {
            return Self::UserRejected;
        }
        if message.to_lowercase().contains("revert") {
            return Self::Reverted {
                tx_hash: None,
                reason: message,
            };
        }
        Self::Rpc { code, message }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::UserRejected)
    }

    /// Hash of the transaction this error refers to, once it was broadcast.
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            Self::Reverted { tx_hash, .. } => tx_hash.as_deref(),
            Self::Unconfirmed { tx_hash, .. } => Some(tx_hash),
            _ => None,
        }
    }

    /// Failures where resubmitting the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Rpc { code, .. } => *code == INTERNAL_RPC_CODE,
            Self::Transport(_) => true,
            _ => false,
        }
    }
}

/// Mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
}

#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Account that signs transactions, once connected.
    fn account(&self) -> Option<String>;

    fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    /// Lock `total_cost` for a new game. The call is payable with that value.
    async fn start_game(&self, session_id: u64, total_cost: Wei) -> TxResult<TxReceipt>;

    /// Settle a game, paying `prize` to the player.
    async fn end_game(&self, session_id: u64, prize: Wei) -> TxResult<TxReceipt>;

    /// Owner only.
    async fn withdraw(&self, amount: Wei) -> TxResult<TxReceipt>;

    /// Owner only. Closes games whose players never revealed.
    async fn finalize_expired_games(&self) -> TxResult<TxReceipt>;

    async fn owner(&self) -> TxResult<String>;

    async fn contract_balance(&self) -> TxResult<Wei>;
}
