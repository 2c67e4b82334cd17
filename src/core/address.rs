//! Chain addresses: base58 shape check and the `WalletAddress` newtype.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Shortest base58 rendering of a 32-byte public key we accept.
pub const MIN_ADDRESS_LEN: usize = 32;
/// Longest base58 rendering of a 32-byte public key.
pub const MAX_ADDRESS_LEN: usize = 44;
/// Decoded public key length.
pub const PUBLIC_KEY_BYTES: usize = 32;

static BASE58: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[1-9A-HJ-NP-Za-km-z]+$").expect("base58 regex")
});

/// True iff `candidate` looks like a chain address: base58 charset only,
/// length within [`MIN_ADDRESS_LEN`]..=[`MAX_ADDRESS_LEN`].
pub fn is_valid_address(candidate: &str) -> bool {
    (MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&candidate.len()) && BASE58.is_match(candidate)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid wallet address format: {0}")]
    Shape(String),

    #[error("Invalid wallet address: expected {expected} key bytes, got {got}")]
    KeyLength { expected: usize, got: usize },
}

/// A validated chain address (base58 of a 32-byte public key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let raw = raw.trim();
        if !is_valid_address(raw) {
            return Err(AddressError::Shape(raw.to_string()));
        }
        let bytes = bs58::decode(raw)
            .into_vec()
            .map_err(|_| AddressError::Shape(raw.to_string()))?;
        if bytes.len() != PUBLIC_KEY_BYTES {
            return Err(AddressError::KeyLength { expected: PUBLIC_KEY_BYTES, got: bytes.len() });
        }
        Ok(Self(raw.to_string()))
    }

    /// Address of a raw 32-byte public key.
    pub fn from_public_key(key: &[u8; PUBLIC_KEY_BYTES]) -> Self {
        Self(bs58::encode(key).into_string())
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// `ABCD...WXYZ`, the form shown on the wallet button.
    pub fn short(&self) -> String {
        let s = &self.0;
        format!("{}...{}", &s[..4], &s[s.len() - 4..])
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl FromStr for WalletAddress {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl TryFrom<String> for WalletAddress {
    type Error = AddressError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self { value.0 }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str { &self.0 }
}
