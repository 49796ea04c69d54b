//! # Addresses
//!
//! 20-byte account and market identifiers. Externally-owned accounts derive
//! theirs from a secp256k1 public key; markets derive theirs from the creating
//! registry and a creation nonce.

use std::fmt;
use std::str::FromStr;

use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{error::Result, MarketError};

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// A 20-byte identifier rendered as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Address of the account controlled by `public_key`.
    ///
    /// Last 20 bytes of SHA-256 over the compressed key encoding.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self::from_digest(&public_key.serialize())
    }

    /// Address of the account controlled by a 32-byte secret key.
    pub fn from_secret_key(secret_key: &[u8]) -> Result<Self> {
        let secp = Secp256k1::signing_only();
        let secret_key = SecretKey::from_slice(secret_key)?;
        Ok(Self::from_public_key(&PublicKey::from_secret_key(
            &secp,
            &secret_key,
        )))
    }

    /// Contract-style address for the `nonce`-th object created by `creator`.
    pub fn derive(creator: &Address, nonce: u64) -> Self {
        let mut preimage = Vec::with_capacity(ADDRESS_LEN + 8);
        preimage.extend_from_slice(&creator.0);
        preimage.extend_from_slice(&nonce.to_be_bytes());
        Self::from_digest(&preimage)
    }

    fn from_digest(preimage: &[u8]) -> Self {
        let hash = Sha256::digest(preimage);
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hash[hash.len() - ADDRESS_LEN..]);
        Self(bytes)
    }

    /// Shortened form for log lines and tables (`0x1234…abcd`)
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}…{}", &full[..4], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| MarketError::InvalidAddress(format!("{s}: {e}")))?;
        let bytes: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            MarketError::InvalidAddress(format!(
                "{s}: expected {ADDRESS_LEN} bytes, got {}",
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
