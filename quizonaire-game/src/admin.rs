//! Contract owner operations.

use quizonaire_core::{ContractGateway, TransactionError, TxReceipt, TxResult, Wei};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerStatus {
    pub owner: String,
    pub account: Option<String>,
    pub balance: Wei,
}

impl OwnerStatus {
    pub fn is_owner(&self) -> bool {
        self.account
            .as_deref()
            .map_or(false, |account| account.eq_ignore_ascii_case(&self.owner))
    }
}

pub struct OwnerConsole {
    gateway: Arc<dyn ContractGateway>,
}

impl OwnerConsole {
    pub fn new(gateway: Arc<dyn ContractGateway>) -> Self {
        Self { gateway }
    }

    pub async fn status(&self) -> TxResult<OwnerStatus> {
        let owner = self.gateway.owner().await?;
        let balance = self.gateway.contract_balance().await?;
        Ok(OwnerStatus {
            owner,
            account: self.gateway.account(),
            balance,
        })
    }

    /// Withdraw the whole contract balance. Returns `None` when there is
    /// nothing to withdraw.
    pub async fn withdraw_all(&self) -> TxResult<Option<(Wei, TxReceipt)>> {
        self.ensure_owner().await?;

        let balance = self.gateway.contract_balance().await?;
        if balance == Wei::ZERO {
            tracing::info!("Contract balance is zero, nothing to withdraw");
            return Ok(None);
        }

        let receipt = self.gateway.withdraw(balance).await?;
        tracing::info!("Withdrew {} in tx {}", balance, receipt.tx_hash);
        Ok(Some((balance, receipt)))
    }

    /// Close every game the contract considers expired.
    pub async fn finalize_expired(&self) -> TxResult<TxReceipt> {
        self.ensure_owner().await?;

        let receipt = self.gateway.finalize_expired_games().await?;
        tracing::info!("Finalized expired games in tx {}", receipt.tx_hash);
        Ok(receipt)
    }

    async fn ensure_owner(&self) -> TxResult<()> {
        let account = self
            .gateway
            .account()
            .ok_or(TransactionError::NotConnected)?;
        let owner = self.gateway.owner().await?;

        if !account.eq_ignore_ascii_case(&owner) {
            tracing::warn!("Account {} is not the contract owner {}", account, owner);
            return Err(TransactionError::NotOwner { account });
        }
        Ok(())
    }
}
