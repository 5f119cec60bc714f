//! Ledger amounts.
//!
//! Game costs and prizes are computed as `f64` coin amounts; the contract only
//! understands integer wei. [`Wei::from_coins`] is the single place where that
//! conversion happens.

use crate::error::{QuizonaireError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimals of the native coin.
pub const DECIMALS: u32 = 18;

const WEI_PER_COIN: u128 = 1_000_000_000_000_000_000;

/// Amount of the ledger's smallest unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    pub const fn as_u128(self) -> u128 {
        self.0
    }

    /// Convert a coin amount to wei.
    ///
    /// The amount is first rendered as its shortest round-trip decimal string,
    /// then converted digit by digit. Digits beyond the 18th decimal are
    /// rounded half-up.
    pub fn from_coins(amount: f64) -> Result<Self> {
        if !amount.is_finite() {
            return Err(QuizonaireError::invalid_amount(format!(
                "amount must be finite, got {}",
                amount
            )));
        }
        if amount < 0.0 {
            return Err(QuizonaireError::invalid_amount(format!(
                "amount must not be negative, got {}",
                amount
            )));
        }

        Self::parse_coins(&amount.to_string())
    }

    /// Parse a plain decimal coin string (`"0.045"`, `"15"`) into wei.
    pub fn parse_coins(text: &str) -> Result<Self> {
        let text = text.trim();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(QuizonaireError::invalid_amount("empty amount"));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(QuizonaireError::invalid_amount(format!(
                "not a decimal amount: {}",
                text
            )));
        }

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| QuizonaireError::invalid_amount(format!("amount too large: {}", text)))?
        };

        let decimals = DECIMALS as usize;
        let mut frac_digits: String = frac_part.chars().take(decimals).collect();
        while frac_digits.len() < decimals {
            frac_digits.push('0');
        }
        let mut fraction: u128 = frac_digits
            .parse()
            .map_err(|_| QuizonaireError::invalid_amount(format!("bad fraction: {}", text)))?;

        // round half-up on the first dropped digit
        if let Some(next) = frac_part.chars().nth(decimals) {
            if next >= '5' {
                fraction += 1;
            }
        }

        whole
            .checked_mul(WEI_PER_COIN)
            .and_then(|w| w.checked_add(fraction))
            .map(Wei)
            .ok_or_else(|| QuizonaireError::invalid_amount(format!("amount too large: {}", text)))
    }

    /// Lossy conversion back to coins, for display only.
    pub fn to_coins(self) -> f64 {
        self.0 as f64 / WEI_PER_COIN as f64
    }

    pub fn checked_add(self, other: Wei) -> Option<Wei> {
        self.0.checked_add(other.0).map(Wei)
    }

    pub fn checked_sub(self, other: Wei) -> Option<Wei> {
        self.0.checked_sub(other.0).map(Wei)
    }
}

impl fmt::Display for Wei {
    /// Exact decimal coin representation with trailing zeros trimmed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / WEI_PER_COIN;
        let fraction = self.0 % WEI_PER_COIN;
        if fraction == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", fraction);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_and_fractional_coins() {
        assert_eq!(Wei::from_coins(15.0).unwrap().as_u128(), 15 * WEI_PER_COIN);
        assert_eq!(
            Wei::from_coins(0.045).unwrap().as_u128(),
            45_000_000_000_000_000
        );
        assert_eq!(Wei::from_coins(0.0).unwrap(), Wei::ZERO);
    }

    #[test]
    fn test_float_noise_uses_shortest_representation() {
        // 0.1 + 0.2 renders as 0.30000000000000004
        let wei = Wei::from_coins(0.1 + 0.2).unwrap();
        assert_eq!(wei.as_u128(), 300_000_000_000_000_040);
    }

    #[test]
    fn test_rounds_half_up_past_eighteen_decimals() {
        let down = Wei::parse_coins("0.0000000000000000014").unwrap();
        assert_eq!(down.as_u128(), 1);

        let up = Wei::parse_coins("0.0000000000000000015").unwrap();
        assert_eq!(up.as_u128(), 2);
    }

    #[test]
    fn test_rejects_invalid_amounts() {
        assert!(Wei::from_coins(-1.0).is_err());
        assert!(Wei::from_coins(f64::NAN).is_err());
        assert!(Wei::from_coins(f64::INFINITY).is_err());
        assert!(Wei::parse_coins("1e5").is_err());
        assert!(Wei::parse_coins("").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Wei::from_wei(15 * WEI_PER_COIN).to_string(), "15");
        assert_eq!(Wei::from_wei(45_000_000_000_000_000).to_string(), "0.045");
        assert_eq!(Wei::from_wei(1).to_string(), "0.000000000000000001");
    }
}
