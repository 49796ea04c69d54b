//! # Resolution
//!
//! The authority that decides a market's outcome is pluggable. A market asks a
//! [`Resolver`] for the outcome once its admin triggers resolution:
//!
//! - [`ManualResolver`] returns the outcome the admin picked. This is what
//!   `Market::resolve` uses.
//! - [`SignedOracleResolver`] returns the outcome an oracle attested to with a
//!   BIP-340 Schnorr signature, and refuses anything it cannot verify.

use secp256k1::{schnorr, Keypair, Message, Secp256k1, SecretKey, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{error::Result, Address, MarketError, Outcome};

/// What a resolver gets to look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolutionContext {
    pub market: Address,
    pub resolution_deadline: u64,
    pub now: u64,
}

/// Decides the winning outcome of a market.
pub trait Resolver {
    fn resolve(&self, ctx: &ResolutionContext) -> Result<Outcome>;
}

/// Outcome chosen by hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManualResolver {
    outcome: Outcome,
}

impl ManualResolver {
    pub fn new(outcome: Outcome) -> Self {
        Self { outcome }
    }
}

impl Resolver for ManualResolver {
    fn resolve(&self, _ctx: &ResolutionContext) -> Result<Outcome> {
        Ok(self.outcome)
    }
}

/// An oracle's signed statement about a market's outcome.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OracleAttestation {
    pub outcome: Outcome,
    /// 64-byte Schnorr signature, hex-encoded
    pub signature: String,
}

/// Outcome taken from a verified oracle attestation.
#[derive(Clone, Debug)]
pub struct SignedOracleResolver {
    oracle_pubkey: XOnlyPublicKey,
    attestation: OracleAttestation,
}

impl SignedOracleResolver {
    /// `oracle_pubkey` is the oracle's 32-byte x-only key, hex-encoded.
    pub fn new(oracle_pubkey: &str, attestation: OracleAttestation) -> Result<Self> {
        let bytes = hex::decode(oracle_pubkey)?;
        let oracle_pubkey = XOnlyPublicKey::from_slice(&bytes)
            .map_err(|e| MarketError::InvalidSignature(format!("Invalid oracle pubkey: {e}")))?;
        Ok(Self {
            oracle_pubkey,
            attestation,
        })
    }
}

impl Resolver for SignedOracleResolver {
    fn resolve(&self, ctx: &ResolutionContext) -> Result<Outcome> {
        let signature_bytes = hex::decode(&self.attestation.signature)?;
        if signature_bytes.len() != 64 {
            return Err(MarketError::InvalidSignature(format!(
                "Invalid signature length: expected 64 bytes, got {}",
                signature_bytes.len()
            )));
        }
        let signature = schnorr::Signature::from_slice(&signature_bytes)
            .map_err(|e| MarketError::InvalidSignature(format!("Invalid signature format: {e}")))?;

        let digest = outcome_digest(
            &ctx.market,
            self.attestation.outcome,
            ctx.resolution_deadline,
        );
        let message = Message::from_digest(digest);

        let secp = Secp256k1::verification_only();
        secp.verify_schnorr(&signature, &message, &self.oracle_pubkey)
            .map_err(|_| {
                MarketError::Oracle(format!(
                    "Attestation for {} on {} is not signed by the oracle",
                    self.attestation.outcome, ctx.market
                ))
            })?;

        Ok(self.attestation.outcome)
    }
}

/// Message an oracle signs to attest `outcome` for `market`.
///
/// Format: "OracleBetMarket:{market} Outcome:{Yes|No} Deadline:{deadline}"
pub fn outcome_message(market: &Address, outcome: Outcome, resolution_deadline: u64) -> String {
    format!("OracleBetMarket:{market} Outcome:{outcome} Deadline:{resolution_deadline}")
}

/// SHA-256 of [`outcome_message`]
pub fn outcome_digest(market: &Address, outcome: Outcome, resolution_deadline: u64) -> [u8; 32] {
    Sha256::digest(outcome_message(market, outcome, resolution_deadline).as_bytes()).into()
}

/// Produce an attestation (oracle side).
pub fn sign_outcome(
    oracle_secret_key: &[u8],
    market: &Address,
    outcome: Outcome,
    resolution_deadline: u64,
) -> Result<OracleAttestation> {
    if oracle_secret_key.len() != 32 {
        return Err(MarketError::InvalidSignature(
            "Oracle secret key must be 32 bytes".to_string(),
        ));
    }

    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(oracle_secret_key)
        .map_err(|e| MarketError::InvalidSignature(format!("Invalid secret key: {e}")))?;
    let keypair = Keypair::from_secret_key(&secp, &secret_key);

    let message = Message::from_digest(outcome_digest(market, outcome, resolution_deadline));
    let signature = secp.sign_schnorr_no_aux_rand(&message, &keypair);

    Ok(OracleAttestation {
        outcome,
        signature: hex::encode(signature.serialize()),
    })
}

/// Hex-encoded x-only public key for an oracle secret key.
pub fn oracle_pubkey(oracle_secret_key: &[u8]) -> Result<String> {
    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(oracle_secret_key)?;
    let (xonly, _parity) = Keypair::from_secret_key(&secp, &secret_key).x_only_public_key();
    Ok(hex::encode(xonly.serialize()))
}

/// External price-feed / oracle references kept for automated resolution.
///
/// Stored only; manual resolution ignores it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    pub price_feed: Option<Address>,
    pub oracle: Option<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORACLE_SECRET: [u8; 32] = [0x11; 32];

    fn ctx() -> ResolutionContext {
        ResolutionContext {
            market: Address::new([9; 20]),
            resolution_deadline: 1_735_689_600,
            now: 1_735_689_700,
        }
    }

    #[test]
    fn test_manual_resolver() {
        assert_eq!(
            ManualResolver::new(Outcome::No).resolve(&ctx()).unwrap(),
            Outcome::No
        );
    }

    #[test]
    fn test_outcome_message_format() {
        let message = outcome_message(&Address::ZERO, Outcome::Yes, 42);
        assert_eq!(
            message,
            format!("OracleBetMarket:{} Outcome:Yes Deadline:42", Address::ZERO)
        );
    }

    #[test]
    fn test_signed_attestation_resolves() {
        let ctx = ctx();
        let attestation =
            sign_outcome(&ORACLE_SECRET, &ctx.market, Outcome::Yes, ctx.resolution_deadline)
                .unwrap();
        let pubkey = oracle_pubkey(&ORACLE_SECRET).unwrap();

        let resolver = SignedOracleResolver::new(&pubkey, attestation).unwrap();
        assert_eq!(resolver.resolve(&ctx).unwrap(), Outcome::Yes);
    }

    #[test]
    fn test_tampered_outcome_is_rejected() {
        let ctx = ctx();
        let mut attestation =
            sign_outcome(&ORACLE_SECRET, &ctx.market, Outcome::Yes, ctx.resolution_deadline)
                .unwrap();
        attestation.outcome = Outcome::No;
        let pubkey = oracle_pubkey(&ORACLE_SECRET).unwrap();

        let resolver = SignedOracleResolver::new(&pubkey, attestation).unwrap();
        assert!(matches!(
            resolver.resolve(&ctx),
            Err(MarketError::Oracle(_))
        ));
    }

    #[test]
    fn test_attestation_is_bound_to_market() {
        let ctx = ctx();
        let other_market = Address::new([8; 20]);
        let attestation =
            sign_outcome(&ORACLE_SECRET, &other_market, Outcome::Yes, ctx.resolution_deadline)
                .unwrap();
        let pubkey = oracle_pubkey(&ORACLE_SECRET).unwrap();

        let resolver = SignedOracleResolver::new(&pubkey, attestation).unwrap();
        assert!(resolver.resolve(&ctx).is_err());
    }

    #[test]
    fn test_wrong_oracle_is_rejected() {
        let ctx = ctx();
        let attestation =
            sign_outcome(&[0x22; 32], &ctx.market, Outcome::Yes, ctx.resolution_deadline)
                .unwrap();
        let pubkey = oracle_pubkey(&ORACLE_SECRET).unwrap();

        let resolver = SignedOracleResolver::new(&pubkey, attestation).unwrap();
        assert!(resolver.resolve(&ctx).is_err());
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(SignedOracleResolver::new(
            "not-hex",
            OracleAttestation {
                outcome: Outcome::Yes,
                signature: String::new(),
            }
        )
        .is_err());

        let pubkey = oracle_pubkey(&ORACLE_SECRET).unwrap();
        let resolver = SignedOracleResolver::new(
            &pubkey,
            OracleAttestation {
                outcome: Outcome::Yes,
                signature: "00".repeat(10),
            },
        )
        .unwrap();
        assert!(matches!(
            resolver.resolve(&ctx()),
            Err(MarketError::InvalidSignature(_))
        ));

        assert!(sign_outcome(&[1; 16], &Address::ZERO, Outcome::Yes, 0).is_err());
    }
}
