//! Minimal ABI encoding for the quiz contract calls.
//!
//! Every argument the contract takes is a `uint256`, so only static words are
//! supported.

use super::{TransactionError, TxResult};
use sha3::{Digest, Keccak256};

pub const START_GAME: &str = "startGame(uint256,uint256)";
pub const END_GAME: &str = "endGame(uint256,uint256)";
pub const WITHDRAW: &str = "withdraw(uint256)";
pub const END_EXPIRED_GAMES: &str = "endExpiredGames()";
pub const OWNER: &str = "owner()";

const WORD: usize = 32;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// First four bytes of the Keccak-256 of the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn encode_uint(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 16..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn encode_call(signature: &str, args: &[u128]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&encode_uint(*arg));
    }
    data
}

pub fn to_hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn decode_hex(value: &str) -> TxResult<Vec<u8>> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(stripped)
        .map_err(|e| TransactionError::InvalidResponse(format!("bad hex '{}': {}", value, e)))
}

/// Decode a single returned `address` word.
pub fn decode_address(value: &str) -> TxResult<String> {
    let bytes = decode_hex(value)?;
    if bytes.len() != WORD {
        return Err(TransactionError::InvalidResponse(format!(
            "expected a 32-byte word, got {} bytes",
            bytes.len()
        )));
    }
    Ok(format!("0x{}", hex::encode(&bytes[12..])))
}

/// Decode a hex quantity (`0x1bc16d674ec80000`) or a 32-byte word.
pub fn decode_quantity(value: &str) -> TxResult<u128> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let trimmed = stripped.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(0);
    }
    if trimmed.len() > 32 {
        return Err(TransactionError::InvalidResponse(format!(
            "quantity does not fit in 128 bits: {}",
            value
        )));
    }
    u128::from_str_radix(trimmed, 16)
        .map_err(|e| TransactionError::InvalidResponse(format!("bad quantity '{}': {}", value, e)))
}

pub fn encode_quantity(value: u128) -> String {
    format!("0x{:x}", value)
}
