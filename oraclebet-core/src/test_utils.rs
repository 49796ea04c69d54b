//! Common test utilities for oraclebet-core tests.
//!
//! This module provides shared functionality for testing across all modules,
//! including market creation, address generation, and accounts that misbehave
//! when paid.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    account::Account,
    clock::ManualClock,
    error::Result,
    market::{Market, MarketParams},
    registry::MarketRegistry,
    Address, Amount, MarketError,
};

use self::constants::*;

/// Deterministic address for the `index`-th test participant.
pub fn test_address(index: u8) -> Address {
    Address::new([index; 20])
}

/// Address derived from a deterministic secp256k1 key, for tests that need a
/// key-backed identity.
pub fn key_address(index: u8) -> Address {
    let mut secret_bytes = [0u8; 32];
    secret_bytes[0] = index;
    secret_bytes[31] = index;
    Address::from_secret_key(&secret_bytes).expect("index must be non-zero")
}

/// A manual clock set to `TEST_NOW`.
pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(TEST_NOW))
}

/// Standard open market administered by `test_address(TEST_ADMIN)` with an
/// empty pool, deadline `TEST_DEADLINE`.
pub fn create_test_market() -> (Market, Arc<ManualClock>) {
    let clock = test_clock();
    let market = Market::new(
        Address::derive(&test_address(TEST_REGISTRY), 0),
        0,
        MarketParams {
            title: "Will BTC reach $100k?".to_string(),
            description: "Resolves Yes if BTC trades above $100,000 before the deadline"
                .to_string(),
            resolution_deadline: TEST_DEADLINE,
            admin: test_address(TEST_ADMIN),
        },
        clock.clone(),
    )
    .expect("test deadline is in the future");
    (market, clock)
}

/// Test market with one Yes buyer per entry of `yes_bets` (addresses 1, 2,
/// ...) and one No buyer per entry of `no_bets` (addresses 10, 11, ...).
pub fn create_test_market_with_bets(
    yes_bets: &[Amount],
    no_bets: &[Amount],
) -> (Market, Arc<ManualClock>) {
    let (market, clock) = create_test_market();
    for (i, value) in yes_bets.iter().enumerate() {
        market
            .buy_yes(&test_address(i as u8 + 1), *value)
            .expect("yes bet");
    }
    for (i, value) in no_bets.iter().enumerate() {
        market
            .buy_no(&test_address(i as u8 + 10), *value)
            .expect("no bet");
    }
    (market, clock)
}

/// Empty registry at `test_address(TEST_REGISTRY)`.
pub fn create_test_registry() -> (MarketRegistry, Arc<ManualClock>) {
    let clock = test_clock();
    let registry = MarketRegistry::new(test_address(TEST_REGISTRY), clock.clone());
    (registry, clock)
}

/// Accepts every transfer and remembers it.
#[derive(Debug)]
pub struct RecordingAccount {
    address: Address,
    received: Mutex<Vec<Amount>>,
}

impl RecordingAccount {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<Amount> {
        self.received.lock().clone()
    }

    pub fn total_received(&self) -> Amount {
        self.received.lock().iter().sum()
    }
}

impl Account for RecordingAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn receive(&self, amount: Amount) -> Result<()> {
        self.received.lock().push(amount);
        Ok(())
    }
}

/// Refuses every transfer.
#[derive(Debug)]
pub struct RejectingAccount {
    pub address: Address,
}

impl Account for RejectingAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn receive(&self, _amount: Amount) -> Result<()> {
        Err(MarketError::Other("recipient refused payment".to_string()))
    }
}

/// What a [`ReentrantAccount`] tries while being paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reentry {
    Redeem,
    BuyYes(Amount),
    BuyNo(Amount),
    RemoveLiquidity(Amount, Amount),
}

/// Calls back into the paying market from `receive`, records what happened,
/// and then accepts the payment.
pub struct ReentrantAccount<'a> {
    address: Address,
    market: &'a Market,
    reentry: Reentry,
    received: Mutex<Vec<Amount>>,
    nested: Mutex<Vec<Result<Amount>>>,
}

impl<'a> ReentrantAccount<'a> {
    pub fn new(address: Address, market: &'a Market, reentry: Reentry) -> Self {
        Self {
            address,
            market,
            reentry,
            received: Mutex::new(Vec::new()),
            nested: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<Amount> {
        self.received.lock().clone()
    }

    /// Results of the nested calls, in order
    pub fn take_nested_results(&self) -> Vec<Result<Amount>> {
        std::mem::take(&mut *self.nested.lock())
    }
}

impl Account for ReentrantAccount<'_> {
    fn address(&self) -> Address {
        self.address
    }

    fn receive(&self, amount: Amount) -> Result<()> {
        let nested = match self.reentry {
            Reentry::Redeem => self.market.redeem(self),
            Reentry::BuyYes(value) => self.market.buy_yes(&self.address, value),
            Reentry::BuyNo(value) => self.market.buy_no(&self.address, value),
            Reentry::RemoveLiquidity(yes, no) => self.market.remove_liquidity(self, yes, no),
        };
        self.nested.lock().push(nested);
        self.received.lock().push(amount);
        Ok(())
    }
}

/// Common test constants
pub mod constants {
    use crate::ONE;

    /// Standard "current time" (Jan 1, 2025)
    pub const TEST_NOW: u64 = 1735689600;

    /// Standard resolution deadline, 30 days after `TEST_NOW`
    pub const TEST_DEADLINE: u64 = TEST_NOW + 30 * 24 * 60 * 60;

    /// Index of the admin address of test markets
    pub const TEST_ADMIN: u8 = 0xad;

    /// Index of the test registry's address
    pub const TEST_REGISTRY: u8 = 0xf0;

    /// Oracle secret key used for signed resolution tests
    pub const TEST_ORACLE_SECRET: [u8; 32] = [0x11; 32];

    /// Typical liquidity deposit
    pub const TEST_LIQUIDITY: u128 = 1000 * ONE;
}
