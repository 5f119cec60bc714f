//! JSON-RPC gateway for an EVM node that holds the player's signer.

use super::abi::{self, END_EXPIRED_GAMES, END_GAME, OWNER, START_GAME, WITHDRAW};
use super::{ContractGateway, TransactionError, TxReceipt, TxResult};
use crate::config::QuizConfig;
use crate::units::Wei;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub struct RpcGateway {
    url: String,
    contract: String,
    chain_id: u64,
    configured_account: Option<String>,
    account: RwLock<Option<String>>,
    poll_interval: Duration,
    client: Client,
}

impl RpcGateway {
    pub fn new(config: &QuizConfig) -> Self {
        Self {
            url: config.network.rpc_url.clone(),
            contract: config.contract_address.clone(),
            chain_id: config.network.chain_id,
            configured_account: config.account.clone(),
            account: RwLock::new(None),
            poll_interval: config.network.receipt_poll_interval,
            client: Client::new(),
        }
    }

    /// Verify the chain and resolve the sending account.
    pub async fn connect(&self) -> TxResult<String> {
        let chain_hex: String = self.call_typed("eth_chainId", vec![]).await?;
        let actual = abi::decode_quantity(&chain_hex)? as u64;
        if actual != self.chain_id {
            return Err(TransactionError::ChainMismatch {
                expected: self.chain_id,
                actual,
            });
        }

        let account = match &self.configured_account {
            Some(account) => account.clone(),
            None => {
                let accounts: Vec<String> = self.call_typed("eth_accounts", vec![]).await?;
                accounts
                    .into_iter()
                    .next()
                    .ok_or(TransactionError::NotConnected)?
            }
        };

        *self.account.write() = Some(account.clone());
        tracing::info!("Connected to chain {} as {}", actual, account);
        Ok(account)
    }

    pub fn disconnect(&self) {
        *self.account.write() = None;
        tracing::info!("Gateway disconnected");
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> TxResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        tracing::debug!("RPC {} -> {}", method, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransactionError::Transport(e.to_string()))?;

        let json: RpcResponse = response
            .json()
            .await
            .map_err(|e| TransactionError::Transport(e.to_string()))?;

        if let Some(error) = json.error {
            return Err(TransactionError::from_rpc(error.code, error.message));
        }

        Ok(json.result.unwrap_or(Value::Null))
    }

    async fn call_typed<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> TxResult<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| TransactionError::InvalidResponse(format!("{}: {}", method, e)))
    }

    fn sender(&self) -> TxResult<String> {
        self.account().ok_or(TransactionError::NotConnected)
    }

    async fn send_transaction(&self, data: Vec<u8>, value: Wei) -> TxResult<TxReceipt> {
        let from = self.sender()?;
        let tx = json!({
            "from": from,
            "to": self.contract,
            "data": abi::to_hex_data(&data),
            "value": abi::encode_quantity(value.as_u128()),
        });

        let tx_hash: String = self.call_typed("eth_sendTransaction", vec![tx]).await?;
        tracing::info!("Transaction sent: {}", tx_hash);

        self.wait_for_receipt(&tx_hash).await
    }

    /// Poll until the transaction is mined. Never gives up on its own: the
    /// caller must only learn the outcome once it is final. Reading a receipt
    /// has no side effects, so transient failures are retried.
    async fn wait_for_receipt(&self, tx_hash: &str) -> TxResult<TxReceipt> {
        loop {
            match self
                .call("eth_getTransactionReceipt", vec![json!(tx_hash)])
                .await
            {
                Ok(Value::Null) => {}
                Ok(result) => return Self::parse_receipt(tx_hash, result),
                Err(e) if e.is_transient() => {
                    tracing::warn!("Receipt poll for {} failed, retrying: {}", tx_hash, e);
                }
                Err(e) => {
                    return Err(TransactionError::Unconfirmed {
                        tx_hash: tx_hash.to_string(),
                        reason: e.to_string(),
                    })
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn parse_receipt(tx_hash: &str, result: Value) -> TxResult<TxReceipt> {
        let unconfirmed = |reason: String| TransactionError::Unconfirmed {
            tx_hash: tx_hash.to_string(),
            reason,
        };
        let raw: RawReceipt =
            serde_json::from_value(result).map_err(|e| unconfirmed(e.to_string()))?;
        match raw.into_receipt(tx_hash) {
            Err(e @ TransactionError::Reverted { .. }) => Err(e),
            Err(e) => Err(unconfirmed(e.to_string())),
            Ok(receipt) => Ok(receipt),
        }
    }

    async fn eth_call(&self, data: Vec<u8>) -> TxResult<String> {
        let call = json!({
            "to": self.contract,
            "data": abi::to_hex_data(&data),
        });
        self.call_typed("eth_call", vec![call, json!("latest")]).await
    }
}

#[async_trait]
impl ContractGateway for RpcGateway {
    fn account(&self) -> Option<String> {
        self.account.read().clone()
    }

    async fn start_game(&self, session_id: u64, total_cost: Wei) -> TxResult<TxReceipt> {
        let data = abi::encode_call(START_GAME, &[session_id as u128, total_cost.as_u128()]);
        self.send_transaction(data, total_cost).await
    }

    async fn end_game(&self, session_id: u64, prize: Wei) -> TxResult<TxReceipt> {
        let data = abi::encode_call(END_GAME, &[session_id as u128, prize.as_u128()]);
        self.send_transaction(data, Wei::ZERO).await
    }

    async fn withdraw(&self, amount: Wei) -> TxResult<TxReceipt> {
        let data = abi::encode_call(WITHDRAW, &[amount.as_u128()]);
        self.send_transaction(data, Wei::ZERO).await
    }

    async fn finalize_expired_games(&self) -> TxResult<TxReceipt> {
        let data = abi::encode_call(END_EXPIRED_GAMES, &[]);
        self.send_transaction(data, Wei::ZERO).await
    }

    async fn owner(&self) -> TxResult<String> {
        let word = self.eth_call(abi::encode_call(OWNER, &[])).await?;
        abi::decode_address(&word)
    }

    async fn contract_balance(&self) -> TxResult<Wei> {
        let balance: String = self
            .call_typed("eth_getBalance", vec![json!(self.contract), json!("latest")])
            .await?;
        Ok(Wei::from_wei(abi::decode_quantity(&balance)?))
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    status: Option<String>,
    block_number: Option<String>,
    gas_used: Option<String>,
}

impl RawReceipt {
    fn into_receipt(self, tx_hash: &str) -> TxResult<TxReceipt> {
        let succeeded = match self.status.as_deref() {
            Some(status) => abi::decode_quantity(status)? == 1,
            // pre-byzantium receipts carry no status
            None => true,
        };

        if !succeeded {
            return Err(TransactionError::Reverted {
                tx_hash: Some(tx_hash.to_string()),
                reason: "transaction failed on-chain".to_string(),
            });
        }

        let block_number = self
            .block_number
            .as_deref()
            .map(abi::decode_quantity)
            .transpose()?
            .map(|n| n as u64);
        let gas_used = self
            .gas_used
            .as_deref()
            .map(abi::decode_quantity)
            .transpose()?
            .map(|n| n as u64);

        Ok(TxReceipt {
            tx_hash: tx_hash.to_string(),
            block_number,
            gas_used,
        })
    }
}
