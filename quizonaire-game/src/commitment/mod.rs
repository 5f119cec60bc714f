pub mod scheme;

pub use scheme::{CommitmentScheme, Keccak256Scheme};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Keccak-256 digest standing in for an answer text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnswerDigest([u8; 32]);

impl AnswerDigest {
    pub fn of(text: &str) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(text.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Recorded when the clock runs out. No text hashes to all zeros, so it
    /// never equals a correct-answer digest.
    pub const fn forfeit() -> Self {
        Self([0u8; 32])
    }

    pub fn is_forfeit(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn matches(&self, text: &str) -> bool {
        !self.is_forfeit() && Self::of(text) == *self
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(value: &str) -> Option<Self> {
        let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value)).ok()?;
        let array: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(array))
    }
}

/// Hash an answer text.
pub fn hash(text: &str) -> AnswerDigest {
    AnswerDigest::of(text)
}

/// Recover the plaintext behind `digest` by trying each known option.
pub fn reveal<'a>(options: &'a [String], digest: &AnswerDigest) -> Option<&'a str> {
    options
        .iter()
        .find(|option| digest.matches(option))
        .map(String::as_str)
}

impl fmt::Debug for AnswerDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnswerDigest({})", self.to_hex())
    }
}

impl fmt::Display for AnswerDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for AnswerDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AnswerDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        AnswerDigest::from_hex(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid digest: {}", value)))
    }
}
