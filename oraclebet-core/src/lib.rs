//! # OracleBet Core
//!
//! Core Rust library for binary Yes/No prediction markets with an AMM price
//! and pro-rata redemption.
//!
//! This library provides the building blocks for markets where:
//! - A registry creates markets and keeps a directory of them
//! - Each market holds a collateral pool and one claim token per outcome
//! - Both outcomes are priced continuously from outstanding claims
//! - The admin resolves after a deadline, manually or from a signed oracle attestation
//! - Winners redeem their share of the pool
//!
//! ## Features
//!
//! - **Market Creation**: Markets with a title, description and resolution deadline
//! - **Trading**: Buy Yes or No shares; prices move with each trade
//! - **Liquidity**: Deposit collateral for shares of both sides, or withdraw it
//! - **Resolution**: Pluggable resolvers, including BIP-340 signed oracle outcomes
//! - **Reentrancy Safety**: Payouts cannot be re-entered to spend a claim twice
//!
//! ## Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use oraclebet_core::{Address, ManualClock, MarketRegistry, Outcome, ONE};
//!
//! let clock = Arc::new(ManualClock::new(1_735_689_600));
//! let mut registry = MarketRegistry::new(Address::new([1; 20]), clock.clone());
//!
//! let admin = Address::new([2; 20]);
//! let address = registry.create_market(
//!     &admin,
//!     "Will BTC reach $100k?",
//!     "Resolves Yes above $100,000",
//!     1_735_689_600 + 86_400,
//! )?;
//!
//! let market = registry.get(&address)?;
//! let alice = Address::new([3; 20]);
//! market.buy_yes(&alice, ONE / 2)?;
//!
//! clock.advance(86_400);
//! market.resolve(&admin, Outcome::Yes)?;
//! let payout = market.redeem(&alice)?;
//! assert_eq!(payout, ONE / 2);
//! Ok::<(), oraclebet_core::MarketError>(())
//! ```

pub mod account;
pub mod address;
pub mod clock;
pub mod error;
pub mod events;
mod guard;
pub mod market;
pub mod pricing;
pub mod registry;
pub mod resolver;
pub mod snapshot;
pub mod token;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use account::Account;
pub use address::Address;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{MarketError, Result};
pub use events::{MarketEvent, RegistryEvent};
pub use market::{Market, MarketParams, MarketState, Outcome, ResolutionBasis, UserPosition};
pub use registry::MarketRegistry;
pub use resolver::{
    ManualResolver, OracleAttestation, Resolver, ResolverConfig, SignedOracleResolver,
};
pub use snapshot::{MarketSnapshot, RegistrySnapshot};
pub use token::ClaimToken;
pub use utils::*;

/// Native asset amount in base units (18 decimals)
pub type Amount = u128;

/// One whole unit of the native asset
pub const ONE: Amount = 1_000_000_000_000_000_000;
