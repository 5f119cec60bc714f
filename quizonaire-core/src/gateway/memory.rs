//! In-process stand-in for the quiz contract.
//!
//! Mirrors the contract's bookkeeping closely enough to play offline: stakes
//! are locked per game id, prizes are paid from the house balance, only the
//! owner may withdraw, and games left open longer than the expiry window can
//! be finalized. Failures can be scripted for the next calls.

use super::{ContractGateway, TransactionError, TxReceipt, TxResult};
use crate::units::Wei;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Journal entry of a call that reached the simulated contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayCall {
    StartGame { session_id: u64, value: Wei },
    EndGame { session_id: u64, prize: Wei },
    Withdraw { amount: Wei },
    FinalizeExpired { closed: usize },
}

#[derive(Debug)]
struct OpenGame {
    stake: Wei,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LedgerState {
    balance: Wei,
    games: HashMap<u64, OpenGame>,
    failures: VecDeque<TransactionError>,
    calls: Vec<GatewayCall>,
    tx_counter: u64,
    block: u64,
}

pub struct MemoryGateway {
    owner: String,
    account: Option<String>,
    expiry: Duration,
    state: Mutex<LedgerState>,
}

impl MemoryGateway {
    /// Gateway whose connected account is also the contract owner.
    pub fn new(account: impl Into<String>) -> Self {
        let account = account.into();
        Self {
            owner: account.clone(),
            account: Some(account),
            expiry: Duration::hours(1),
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Gateway with no connected account.
    pub fn disconnected(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            account: None,
            expiry: Duration::hours(1),
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Seed the house balance prizes are paid from.
    pub fn with_house_balance(self, balance: Wei) -> Self {
        self.state.lock().balance = balance;
        self
    }

    /// The next transaction fails with `error` before touching the ledger.
    pub fn fail_next(&self, error: TransactionError) {
        self.state.lock().failures.push_back(error);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    pub fn open_games(&self) -> usize {
        self.state.lock().games.len()
    }

    pub fn stake_of(&self, session_id: u64) -> Option<Wei> {
        self.state.lock().games.get(&session_id).map(|g| g.stake)
    }

    fn transact<F>(&self, apply: F) -> TxResult<TxReceipt>
    where
        F: FnOnce(&mut LedgerState) -> TxResult<GatewayCall>,
    {
        if self.account.is_none() {
            return Err(TransactionError::NotConnected);
        }

        let mut state = self.state.lock();
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }

        let call = apply(&mut state)?;
        state.calls.push(call);
        state.tx_counter += 1;
        state.block += 1;

        Ok(TxReceipt {
            tx_hash: format!("0x{:064x}", state.tx_counter),
            block_number: Some(state.block),
            gas_used: Some(21_000),
        })
    }

    fn ensure_owner(&self) -> TxResult<()> {
        let account = self.account.clone().unwrap_or_default();
        if !account.eq_ignore_ascii_case(&self.owner) {
            return Err(TransactionError::Reverted {
                tx_hash: None,
                reason: format!("caller {} is not the owner", account),
            });
        }
        Ok(())
    }
}

fn revert(reason: &str) -> TransactionError {
    TransactionError::Reverted {
        tx_hash: None,
        reason: reason.to_string(),
    }
}

#[async_trait]
impl ContractGateway for MemoryGateway {
    fn account(&self) -> Option<String> {
        self.account.clone()
    }

    async fn start_game(&self, session_id: u64, total_cost: Wei) -> TxResult<TxReceipt> {
        self.transact(|state| {
            if state.games.contains_key(&session_id) {
                return Err(revert("game already exists"));
            }
            state.balance = state
                .balance
                .checked_add(total_cost)
                .ok_or_else(|| revert("balance overflow"))?;
            state.games.insert(
                session_id,
                OpenGame {
                    stake: total_cost,
                    started_at: Utc::now(),
                },
            );
            Ok(GatewayCall::StartGame {
                session_id,
                value: total_cost,
            })
        })
    }

    async fn end_game(&self, session_id: u64, prize: Wei) -> TxResult<TxReceipt> {
        self.transact(|state| {
            if !state.games.contains_key(&session_id) {
                return Err(revert("game not found"));
            }
            let remaining = state
                .balance
                .checked_sub(prize)
                .ok_or_else(|| revert("insufficient contract balance"))?;
            state.balance = remaining;
            state.games.remove(&session_id);
            Ok(GatewayCall::EndGame { session_id, prize })
        })
    }

    async fn withdraw(&self, amount: Wei) -> TxResult<TxReceipt> {
        self.ensure_owner()?;
        self.transact(|state| {
            state.balance = state
                .balance
                .checked_sub(amount)
                .ok_or_else(|| revert("insufficient contract balance"))?;
            Ok(GatewayCall::Withdraw { amount })
        })
    }

    async fn finalize_expired_games(&self) -> TxResult<TxReceipt> {
        self.ensure_owner()?;
        let cutoff = Utc::now() - self.expiry;
        self.transact(|state| {
            let before = state.games.len();
            state.games.retain(|_, game| game.started_at > cutoff);
            Ok(GatewayCall::FinalizeExpired {
                closed: before - state.games.len(),
            })
        })
    }

    async fn owner(&self) -> TxResult<String> {
        Ok(self.owner.clone())
    }

    async fn contract_balance(&self) -> TxResult<Wei> {
        Ok(self.state.lock().balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: &str = "0x00000000000000000000000000000000000000aa";
    const OWNER: &str = "0x00000000000000000000000000000000000000bb";

    #[tokio::test]
    async fn test_stake_and_settle() {
        let gateway = MemoryGateway::new(PLAYER).with_house_balance(Wei::from_wei(100));

        gateway.start_game(7, Wei::from_wei(40)).await.unwrap();
        assert_eq!(gateway.stake_of(7), Some(Wei::from_wei(40)));
        assert_eq!(gateway.contract_balance().await.unwrap(), Wei::from_wei(140));

        let receipt = gateway.end_game(7, Wei::from_wei(60)).await.unwrap();
        assert!(receipt.tx_hash.starts_with("0x"));
        assert_eq!(gateway.contract_balance().await.unwrap(), Wei::from_wei(80));
        assert_eq!(gateway.open_games(), 0);

        // second settlement of the same game reverts
        assert!(gateway.end_game(7, Wei::ZERO).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_start_reverts() {
        let gateway = MemoryGateway::new(PLAYER);
        gateway.start_game(1, Wei::from_wei(5)).await.unwrap();
        let err = gateway.start_game(1, Wei::from_wei(5)).await.unwrap_err();
        assert!(matches!(err, TransactionError::Reverted { .. }));
    }

    #[tokio::test]
    async fn test_scripted_failure_leaves_ledger_untouched() {
        let gateway = MemoryGateway::new(PLAYER);
        gateway.fail_next(TransactionError::UserRejected);

        let err = gateway.start_game(1, Wei::from_wei(5)).await.unwrap_err();
        assert!(err.is_user_rejection());
        assert_eq!(gateway.open_games(), 0);
        assert!(gateway.calls().is_empty());

        gateway.start_game(1, Wei::from_wei(5)).await.unwrap();
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_only_operations() {
        let gateway = MemoryGateway::new(PLAYER)
            .with_owner(OWNER)
            .with_house_balance(Wei::from_wei(10));
        assert!(gateway.withdraw(Wei::from_wei(1)).await.is_err());
        assert!(gateway.finalize_expired_games().await.is_err());

        let owner_gateway = MemoryGateway::new(OWNER).with_house_balance(Wei::from_wei(10));
        owner_gateway.withdraw(Wei::from_wei(10)).await.unwrap();
        assert_eq!(owner_gateway.contract_balance().await.unwrap(), Wei::ZERO);
    }

    #[tokio::test]
    async fn test_finalize_closes_stale_games() {
        let gateway = MemoryGateway::new(OWNER).with_expiry(Duration::zero());
        gateway.start_game(1, Wei::from_wei(5)).await.unwrap();
        gateway.start_game(2, Wei::from_wei(5)).await.unwrap();

        gateway.finalize_expired_games().await.unwrap();
        assert_eq!(gateway.open_games(), 0);
        assert_eq!(
            gateway.calls().last(),
            Some(&GatewayCall::FinalizeExpired { closed: 2 })
        );
        // stakes stay with the house
        assert_eq!(gateway.contract_balance().await.unwrap(), Wei::from_wei(10));
    }

    #[tokio::test]
    async fn test_disconnected_gateway() {
        let gateway = MemoryGateway::disconnected(OWNER);
        assert!(!gateway.is_connected());
        assert_eq!(
            gateway.start_game(1, Wei::ZERO).await.unwrap_err(),
            TransactionError::NotConnected
        );
    }
}
