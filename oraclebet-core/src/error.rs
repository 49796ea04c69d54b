//! Error types for oraclebet-core

use thiserror::Error;

use crate::Amount;

/// Result type alias for oraclebet operations
pub type Result<T> = std::result::Result<T, MarketError>;

/// Error types for market operations.
///
/// Every failing operation aborts without touching market state, so callers
/// can surface the variant as-is.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Deadline in the past at creation, or resolution attempted too early
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// Caller is not allowed to perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The market has already been resolved
    #[error("Market already resolved")]
    AlreadyResolved,

    /// Redemption attempted while the market is still open
    #[error("Market not resolved")]
    MarketNotResolved,

    /// Caller holds no tokens of the winning side
    #[error("No winning shares")]
    NoWinningShares,

    /// Burn or withdrawal larger than the holder's balance
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    /// Liquidity deposit worth less than the tokens it asks to mint
    #[error("Insufficient collateral: tokens cost {required}, deposit is {provided}")]
    InsufficientCollateral { required: Amount, provided: Amount },

    /// Liquidity withdrawal with different Yes and No amounts
    #[error("Liquidity is withdrawn in matched pairs: {yes} YES vs {no} NO")]
    UnmatchedPairs { yes: Amount, no: Amount },

    /// Trade or liquidity call without value
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Call into a market while another operation on it is still in progress.
    ///
    /// Raised for nested calls made from a payout recipient, and equally for a
    /// call from another thread that arrives mid-operation.
    #[error("Reentrant call detected")]
    ReentrancyDetected,

    /// The recipient rejected an outbound value transfer
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow")]
    Overflow,

    /// Market address unknown to the registry
    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    /// Market validation errors
    #[error("Invalid market: {0}")]
    InvalidMarket(String),

    /// Address validation errors
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Amount parsing errors
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Signature verification errors
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Oracle errors
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Hex decoding errors
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Serde JSON errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Secp256k1 errors
    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),

    /// Generic error for other cases
    #[error("Market error: {0}")]
    Other(String),
}

impl From<&str> for MarketError {
    fn from(msg: &str) -> Self {
        Self::Other(msg.to_string())
    }
}

impl From<String> for MarketError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}
