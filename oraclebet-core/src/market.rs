//! # Prediction Market Implementation
//!
//! A binary market holds a collateral pool and two claim tokens, one per
//! outcome. While the market is open, anyone can buy either side from the AMM
//! or provide liquidity to both sides. After the resolution deadline the admin
//! resolves it, and holders of the winning token redeem a pro-rata share of the
//! pool.
//!
//! Every public operation either commits all of its effects or none. Mutating
//! operations hold the market's entry guard for their whole duration, including
//! any outbound transfer, so a recipient cannot re-enter the market to spend
//! the same claim twice.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    account::Account,
    clock::Clock,
    error::Result,
    events::MarketEvent,
    guard::EntryGuard,
    pricing,
    resolver::{ManualResolver, ResolutionContext, Resolver, ResolverConfig},
    snapshot::MarketSnapshot,
    token::ClaimToken,
    utils::format_timestamp,
    Address, Amount, MarketError,
};

/// One of the two outcomes of a binary market.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    pub fn opposite(self) -> Self {
        match self {
            Outcome::Yes => Outcome::No,
            Outcome::No => Outcome::Yes,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Yes => write!(f, "Yes"),
            Outcome::No => write!(f, "No"),
        }
    }
}

impl FromStr for Outcome {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(Outcome::Yes),
            "no" | "n" | "false" => Ok(Outcome::No),
            _ => Err(MarketError::Other(format!(
                "Unknown outcome '{s}', expected 'yes' or 'no'"
            ))),
        }
    }
}

/// Lifecycle of a market. `Resolved` is terminal.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarketState {
    Open,
    Resolved(Outcome),
}

/// Figures frozen at resolution; every redemption is priced against them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolutionBasis {
    pub outcome: Outcome,
    /// Collateral pool at the moment of resolution
    pub pool: Amount,
    /// Supply of the winning token at the moment of resolution
    pub winning_supply: Amount,
    pub resolved_at: u64,
}

/// Holdings of one address.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserPosition {
    pub yes_balance: Amount,
    pub no_balance: Amount,
    /// Collateral spent buying shares
    pub total_wagered: Amount,
}

/// Public description of one of the market's claim tokens.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub total_supply: Amount,
    pub holders: usize,
}

/// Creation parameters of a market.
#[derive(Clone, Debug)]
pub struct MarketParams {
    pub title: String,
    pub description: String,
    /// Unix timestamp from which the market may be resolved
    pub resolution_deadline: u64,
    /// Address allowed to resolve and configure the market
    pub admin: Address,
}

/// A binary prediction market.
pub struct Market {
    address: Address,
    index: u64,
    title: String,
    description: String,
    resolution_deadline: u64,
    admin: Address,
    clock: Arc<dyn Clock>,
    entered: AtomicBool,
    ledger: Mutex<Ledger>,
}

/// Mutable part of a market.
struct Ledger {
    collateral_pool: Amount,
    total_received: Amount,
    total_paid_out: Amount,
    yes_token: ClaimToken,
    no_token: ClaimToken,
    wagered: BTreeMap<Address, Amount>,
    liquidity: BTreeMap<Address, Amount>,
    resolver_config: ResolverConfig,
    resolution: Option<ResolutionBasis>,
    events: Vec<MarketEvent>,
}

impl Ledger {
    fn token(&self, side: Outcome) -> &ClaimToken {
        match side {
            Outcome::Yes => &self.yes_token,
            Outcome::No => &self.no_token,
        }
    }

    fn token_mut(&mut self, side: Outcome) -> &mut ClaimToken {
        match side {
            Outcome::Yes => &mut self.yes_token,
            Outcome::No => &mut self.no_token,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.resolution.is_some() {
            return Err(MarketError::AlreadyResolved);
        }
        Ok(())
    }

    fn price(&self, side: Outcome) -> Result<u128> {
        pricing::price_of(
            side,
            self.yes_token.total_supply(),
            self.no_token.total_supply(),
        )
    }
}

impl Market {
    /// Creates an open market with an empty pool.
    ///
    /// # Arguments
    /// * `address` - Identifier of the market, also the minter of its tokens
    /// * `index` - Position of the market in its registry
    /// * `params` - Title, description, deadline and admin
    /// * `clock` - Time source used for the resolution gate
    ///
    /// Fails with `InvalidTiming` unless the deadline is strictly in the future.
    pub fn new(
        address: Address,
        index: u64,
        params: MarketParams,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let now = clock.now();
        if params.resolution_deadline <= now {
            return Err(MarketError::InvalidTiming(format!(
                "Resolution deadline {} must be in the future (now {})",
                params.resolution_deadline, now
            )));
        }

        Ok(Self {
            address,
            index,
            title: params.title,
            description: params.description,
            resolution_deadline: params.resolution_deadline,
            admin: params.admin,
            clock,
            entered: AtomicBool::new(false),
            ledger: Mutex::new(Ledger {
                collateral_pool: 0,
                total_received: 0,
                total_paid_out: 0,
                yes_token: ClaimToken::new("Yes Share", "YES", address),
                no_token: ClaimToken::new("No Share", "NO", address),
                wagered: BTreeMap::new(),
                liquidity: BTreeMap::new(),
                resolver_config: ResolverConfig::default(),
                resolution: None,
                events: Vec::new(),
            }),
        })
    }

    fn enter(&self) -> Result<EntryGuard<'_>> {
        EntryGuard::acquire(&self.entered).inspect_err(|_| {
            warn!(market = %self.address, "Rejected call, market busy with another operation");
        })
    }

    /// Deposit `value` collateral and mint the requested amounts of both
    /// tokens to `caller`.
    ///
    /// The tokens are priced like a buy of each side at the current prices,
    /// and the deposit must cover them; anything above that stays in the pool.
    /// An equal amount of both sides never costs more than that amount.
    pub fn add_liquidity(
        &self,
        caller: &Address,
        yes_amount: Amount,
        no_amount: Amount,
        value: Amount,
    ) -> Result<()> {
        let _guard = self.enter()?;
        let mut ledger = self.ledger.lock();
        ledger.ensure_open()?;
        if value == 0 || (yes_amount == 0 && no_amount == 0) {
            return Err(MarketError::ZeroAmount);
        }
        let required = checked_add(
            pricing::cost_of(yes_amount, ledger.price(Outcome::Yes)?)?,
            pricing::cost_of(no_amount, ledger.price(Outcome::No)?)?,
        )?;
        if required > value {
            return Err(MarketError::InsufficientCollateral {
                required,
                provided: value,
            });
        }

        let pool = checked_add(ledger.collateral_pool, value)?;
        let received = checked_add(ledger.total_received, value)?;
        let provided = checked_add(ledger.liquidity.get(caller).copied().unwrap_or(0), value)?;
        // Pre-check supplies so the second mint cannot fail after the first
        checked_add(ledger.yes_token.total_supply(), yes_amount)?;
        checked_add(ledger.no_token.total_supply(), no_amount)?;

        ledger.yes_token.mint(&self.address, caller, yes_amount)?;
        ledger.no_token.mint(&self.address, caller, no_amount)?;
        ledger.collateral_pool = pool;
        ledger.total_received = received;
        ledger.liquidity.insert(*caller, provided);
        ledger.events.push(MarketEvent::LiquidityAdded {
            provider: *caller,
            yes_amount,
            no_amount,
            value,
        });

        info!(
            market = %self.address,
            provider = %caller,
            yes_amount,
            no_amount,
            value,
            "Liquidity added"
        );
        Ok(())
    }

    /// Burn matched Yes/No pairs and withdraw their share of the pool.
    ///
    /// Exactly one token of a pair wins, so a pair is paid what a winning token
    /// is worth under the less favourable outcome:
    /// `pool * pairs / max(yes_supply, no_supply)`, rounded down. Remaining
    /// holders' claims do not shrink under either outcome. Returns the amount
    /// paid to `caller`.
    pub fn remove_liquidity(
        &self,
        caller: &dyn Account,
        yes_amount: Amount,
        no_amount: Amount,
    ) -> Result<Amount> {
        let _guard = self.enter()?;
        let who = caller.address();

        let mut ledger = self.ledger.lock();
        ledger.ensure_open()?;
        if yes_amount == 0 && no_amount == 0 {
            return Err(MarketError::ZeroAmount);
        }
        if yes_amount != no_amount {
            return Err(MarketError::UnmatchedPairs {
                yes: yes_amount,
                no: no_amount,
            });
        }
        for (side, requested) in [(Outcome::Yes, yes_amount), (Outcome::No, no_amount)] {
            let available = ledger.token(side).balance_of(&who);
            if available < requested {
                return Err(MarketError::InsufficientBalance {
                    requested,
                    available,
                });
            }
        }

        let pairs = yes_amount;
        let deepest = ledger
            .yes_token
            .total_supply()
            .max(ledger.no_token.total_supply());
        let payout = pricing::mul_div(ledger.collateral_pool, pairs, deepest)?;
        let paid_out = checked_add(ledger.total_paid_out, payout)?;
        let previous_liquidity = ledger.liquidity.get(&who).copied();

        ledger.yes_token.burn(&self.address, &who, yes_amount)?;
        ledger.no_token.burn(&self.address, &who, no_amount)?;
        ledger.collateral_pool -= payout;
        ledger.total_paid_out = paid_out;
        match previous_liquidity.map(|provided| provided.saturating_sub(payout)) {
            Some(0) => {
                ledger.liquidity.remove(&who);
            }
            Some(remaining) => {
                ledger.liquidity.insert(who, remaining);
            }
            None => {}
        }
        drop(ledger);

        self.transfer(caller, payout, |ledger| {
            ledger.yes_token.mint(&self.address, &who, yes_amount)?;
            ledger.no_token.mint(&self.address, &who, no_amount)?;
            ledger.collateral_pool += payout;
            ledger.total_paid_out -= payout;
            match previous_liquidity {
                Some(provided) => ledger.liquidity.insert(who, provided),
                None => ledger.liquidity.remove(&who),
            };
            Ok(())
        })?;

        self.ledger.lock().events.push(MarketEvent::LiquidityRemoved {
            provider: who,
            yes_amount,
            no_amount,
            payout,
        });
        info!(
            market = %self.address,
            provider = %who,
            yes_amount,
            no_amount,
            payout,
            "Liquidity removed"
        );
        Ok(payout)
    }

    /// Buy Yes shares with `value` collateral. Returns the shares minted.
    pub fn buy_yes(&self, caller: &Address, value: Amount) -> Result<Amount> {
        self.buy(caller, Outcome::Yes, value)
    }

    /// Buy No shares with `value` collateral. Returns the shares minted.
    pub fn buy_no(&self, caller: &Address, value: Amount) -> Result<Amount> {
        self.buy(caller, Outcome::No, value)
    }

    /// Buy shares of `side` at the current AMM price.
    pub fn buy(&self, caller: &Address, side: Outcome, value: Amount) -> Result<Amount> {
        let _guard = self.enter()?;
        let mut ledger = self.ledger.lock();
        ledger.ensure_open()?;
        if value == 0 {
            return Err(MarketError::ZeroAmount);
        }

        let price = ledger.price(side)?;
        let shares = pricing::shares_for(value, price)?;
        if shares == 0 {
            return Err(MarketError::ZeroAmount);
        }
        debug!(market = %self.address, %side, price, shares, "Priced trade");

        let pool = checked_add(ledger.collateral_pool, value)?;
        let received = checked_add(ledger.total_received, value)?;
        let wagered = checked_add(ledger.wagered.get(caller).copied().unwrap_or(0), value)?;

        ledger.token_mut(side).mint(&self.address, caller, shares)?;
        ledger.collateral_pool = pool;
        ledger.total_received = received;
        ledger.wagered.insert(*caller, wagered);
        ledger.events.push(MarketEvent::SharesBought {
            buyer: *caller,
            side,
            value,
            shares,
            price,
        });

        info!(
            market = %self.address,
            buyer = %caller,
            %side,
            value,
            shares,
            "Shares bought"
        );
        Ok(shares)
    }

    /// Current Yes price, scaled by `PRICE_SCALE`
    pub fn yes_price(&self) -> Result<u128> {
        self.ledger.lock().price(Outcome::Yes)
    }

    /// Current No price, scaled by `PRICE_SCALE`
    pub fn no_price(&self) -> Result<u128> {
        self.ledger.lock().price(Outcome::No)
    }

    pub fn user_position(&self, who: &Address) -> UserPosition {
        let ledger = self.ledger.lock();
        UserPosition {
            yes_balance: ledger.yes_token.balance_of(who),
            no_balance: ledger.no_token.balance_of(who),
            total_wagered: ledger.wagered.get(who).copied().unwrap_or(0),
        }
    }

    /// Resolve the market to `outcome` (admin only, once, after the deadline).
    pub fn resolve(&self, caller: &Address, outcome: Outcome) -> Result<Outcome> {
        self.resolve_with(caller, &ManualResolver::new(outcome))
    }

    /// Resolve the market to whatever `resolver` decides.
    ///
    /// Fails with `Unauthorized` for anyone but the admin, `InvalidTiming`
    /// before the deadline and `AlreadyResolved` on every call after the first
    /// success. On success the pool and winning supply are frozen as the
    /// redemption basis.
    pub fn resolve_with(&self, caller: &Address, resolver: &dyn Resolver) -> Result<Outcome> {
        let _guard = self.enter()?;
        self.ensure_admin(caller)?;

        let now = self.clock.now();
        if now < self.resolution_deadline {
            return Err(MarketError::InvalidTiming(format!(
                "Resolution time not reached: deadline {}, now {}",
                format_timestamp(self.resolution_deadline),
                format_timestamp(now)
            )));
        }
        self.ledger.lock().ensure_open()?;

        // Resolver runs unlocked; the entry guard keeps the state from moving.
        let ctx = ResolutionContext {
            market: self.address,
            resolution_deadline: self.resolution_deadline,
            now,
        };
        let outcome = resolver.resolve(&ctx)?;

        let mut ledger = self.ledger.lock();
        let basis = ResolutionBasis {
            outcome,
            pool: ledger.collateral_pool,
            winning_supply: ledger.token(outcome).total_supply(),
            resolved_at: now,
        };
        ledger.resolution = Some(basis);
        ledger.events.push(MarketEvent::MarketResolved {
            outcome,
            pool: basis.pool,
            winning_supply: basis.winning_supply,
        });

        info!(
            market = %self.address,
            %outcome,
            pool = basis.pool,
            winning_supply = basis.winning_supply,
            "Market resolved"
        );
        if basis.winning_supply == 0 {
            warn!(market = %self.address, %outcome, "Resolved with no winning shares outstanding");
        }
        Ok(outcome)
    }

    /// Exchange the caller's entire winning balance for its share of the pool.
    ///
    /// `payout = shares * basis.pool / basis.winning_supply`, rounded down; the
    /// remainder stays in the pool. Tokens are burned and the pool debited
    /// before the transfer runs. Returns the amount paid.
    pub fn redeem(&self, caller: &dyn Account) -> Result<Amount> {
        let _guard = self.enter()?;
        let who = caller.address();

        let mut ledger = self.ledger.lock();
        let basis = ledger.resolution.ok_or(MarketError::MarketNotResolved)?;
        let side = basis.outcome;
        let shares = ledger.token(side).balance_of(&who);
        if shares == 0 {
            return Err(MarketError::NoWinningShares);
        }

        let payout = pricing::mul_div(shares, basis.pool, basis.winning_supply)?;
        let pool = ledger
            .collateral_pool
            .checked_sub(payout)
            .ok_or(MarketError::Overflow)?;
        let paid_out = checked_add(ledger.total_paid_out, payout)?;

        ledger.token_mut(side).burn(&self.address, &who, shares)?;
        ledger.collateral_pool = pool;
        ledger.total_paid_out = paid_out;
        drop(ledger);

        self.transfer(caller, payout, |ledger| {
            ledger.token_mut(side).mint(&self.address, &who, shares)?;
            ledger.collateral_pool += payout;
            ledger.total_paid_out -= payout;
            Ok(())
        })?;

        self.ledger.lock().events.push(MarketEvent::Redeemed {
            holder: who,
            side,
            shares,
            payout,
        });
        info!(market = %self.address, holder = %who, %side, shares, payout, "Redeemed");
        Ok(payout)
    }

    /// Store references for automated resolution (admin only, open only).
    pub fn set_resolver_config(&self, caller: &Address, config: ResolverConfig) -> Result<()> {
        let _guard = self.enter()?;
        self.ensure_admin(caller)?;

        let mut ledger = self.ledger.lock();
        ledger.ensure_open()?;
        ledger.resolver_config = config.clone();
        ledger.events.push(MarketEvent::ResolverConfigured { config });

        info!(market = %self.address, "Resolver configuration updated");
        Ok(())
    }

    /// Pay `amount` to `recipient` with the ledger unlocked and the entry
    /// guard still held. If the recipient rejects it, `undo` restores the
    /// ledger to its state before the paying operation.
    fn transfer(
        &self,
        recipient: &dyn Account,
        amount: Amount,
        undo: impl FnOnce(&mut Ledger) -> Result<()>,
    ) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        if let Err(err) = recipient.receive(amount) {
            warn!(
                market = %self.address,
                recipient = %recipient.address(),
                amount,
                %err,
                "Transfer rejected, rolling back"
            );
            undo(&mut *self.ledger.lock())?;
            return Err(MarketError::TransferFailed(err.to_string()));
        }
        Ok(())
    }

    fn ensure_admin(&self, caller: &Address) -> Result<()> {
        if *caller != self.admin {
            return Err(MarketError::Unauthorized(format!(
                "{} is not the admin of market {}",
                caller, self.address
            )));
        }
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn resolution_deadline(&self) -> u64 {
        self.resolution_deadline
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn state(&self) -> MarketState {
        match self.ledger.lock().resolution {
            Some(basis) => MarketState::Resolved(basis.outcome),
            None => MarketState::Open,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.ledger.lock().resolution.is_some()
    }

    pub fn winning_outcome(&self) -> Option<Outcome> {
        self.ledger.lock().resolution.map(|basis| basis.outcome)
    }

    pub fn resolution_basis(&self) -> Option<ResolutionBasis> {
        self.ledger.lock().resolution
    }

    pub fn collateral_pool(&self) -> Amount {
        self.ledger.lock().collateral_pool
    }

    /// Collateral ever received
    pub fn total_received(&self) -> Amount {
        self.ledger.lock().total_received
    }

    /// Collateral ever paid out
    pub fn total_paid_out(&self) -> Amount {
        self.ledger.lock().total_paid_out
    }

    pub fn balance_of(&self, side: Outcome, who: &Address) -> Amount {
        self.ledger.lock().token(side).balance_of(who)
    }

    pub fn total_supply(&self, side: Outcome) -> Amount {
        self.ledger.lock().token(side).total_supply()
    }

    pub fn token_info(&self, side: Outcome) -> TokenInfo {
        let ledger = self.ledger.lock();
        let token = ledger.token(side);
        TokenInfo {
            name: token.name().to_string(),
            symbol: token.symbol().to_string(),
            total_supply: token.total_supply(),
            holders: token.holder_count(),
        }
    }

    /// Collateral `who` currently has recorded as provided liquidity
    pub fn liquidity_of(&self, who: &Address) -> Amount {
        self.ledger.lock().liquidity.get(who).copied().unwrap_or(0)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        self.ledger.lock().resolver_config.clone()
    }

    pub fn events(&self) -> Vec<MarketEvent> {
        self.ledger.lock().events.clone()
    }

    /// Get market status summary
    pub fn status_line(&self) -> String {
        match self.winning_outcome() {
            Some(outcome) => format!("Resolved - {outcome} won"),
            None if self.clock.now() >= self.resolution_deadline => {
                "Awaiting resolution".to_string()
            }
            None => "Active - Accepting trades".to_string(),
        }
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        let ledger = self.ledger.lock();
        MarketSnapshot {
            address: self.address,
            index: self.index,
            title: self.title.clone(),
            description: self.description.clone(),
            resolution_deadline: self.resolution_deadline,
            admin: self.admin,
            collateral_pool: ledger.collateral_pool,
            total_received: ledger.total_received,
            total_paid_out: ledger.total_paid_out,
            yes_token: ledger.yes_token.clone(),
            no_token: ledger.no_token.clone(),
            wagered: ledger.wagered.clone(),
            liquidity: ledger.liquidity.clone(),
            resolver_config: ledger.resolver_config.clone(),
            resolution: ledger.resolution,
            events: ledger.events.clone(),
        }
    }

    /// Rebuild a market from a snapshot, checking its invariants.
    ///
    /// Unlike [`Market::new`], the deadline may lie in the past.
    pub fn from_snapshot(snapshot: MarketSnapshot, clock: Arc<dyn Clock>) -> Result<Self> {
        let address = snapshot.address;
        for token in [&snapshot.yes_token, &snapshot.no_token] {
            token.validate()?;
            if token.minter() != address {
                return Err(MarketError::InvalidMarket(format!(
                    "{} token of {} is minted by {}",
                    token.symbol(),
                    address,
                    token.minter()
                )));
            }
        }
        let expected_pool = snapshot
            .total_received
            .checked_sub(snapshot.total_paid_out)
            .ok_or(MarketError::Overflow)?;
        if snapshot.collateral_pool != expected_pool {
            return Err(MarketError::InvalidMarket(format!(
                "Pool of {} is {} but received - paid out is {}",
                address, snapshot.collateral_pool, expected_pool
            )));
        }

        Ok(Self {
            address,
            index: snapshot.index,
            title: snapshot.title,
            description: snapshot.description,
            resolution_deadline: snapshot.resolution_deadline,
            admin: snapshot.admin,
            clock,
            entered: AtomicBool::new(false),
            ledger: Mutex::new(Ledger {
                collateral_pool: snapshot.collateral_pool,
                total_received: snapshot.total_received,
                total_paid_out: snapshot.total_paid_out,
                yes_token: snapshot.yes_token,
                no_token: snapshot.no_token,
                wagered: snapshot.wagered,
                liquidity: snapshot.liquidity,
                resolver_config: snapshot.resolver_config,
                resolution: snapshot.resolution,
                events: snapshot.events,
            }),
        })
    }
}

impl fmt::Debug for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Market")
            .field("address", &self.address)
            .field("index", &self.index)
            .field("title", &self.title)
            .field("resolution_deadline", &self.resolution_deadline)
            .field("admin", &self.admin)
            .field("state", &self.state())
            .field("collateral_pool", &self.collateral_pool())
            .finish()
    }
}

fn checked_add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b).ok_or(MarketError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        constants::{TEST_DEADLINE, TEST_NOW},
        create_test_market, test_address, test_clock,
    };
    use crate::ONE;

    #[test]
    fn test_new_market_is_open_and_empty() {
        let (market, _clock) = create_test_market();
        assert_eq!(market.state(), MarketState::Open);
        assert_eq!(market.collateral_pool(), 0);
        assert_eq!(market.total_supply(Outcome::Yes), 0);
        assert_eq!(market.total_supply(Outcome::No), 0);
        assert_eq!(market.title(), "Will BTC reach $100k?");
        assert_eq!(market.resolution_deadline(), TEST_DEADLINE);
        assert_eq!(market.status_line(), "Active - Accepting trades");
    }

    #[test]
    fn test_new_rejects_past_deadline() {
        let clock = test_clock();
        for deadline in [TEST_NOW - 1, TEST_NOW] {
            let result = Market::new(
                test_address(0xaa),
                0,
                MarketParams {
                    title: "late".to_string(),
                    description: String::new(),
                    resolution_deadline: deadline,
                    admin: test_address(1),
                },
                clock.clone(),
            );
            assert!(matches!(result, Err(MarketError::InvalidTiming(_))));
        }
    }

    #[test]
    fn test_token_metadata() {
        let (market, _clock) = create_test_market();
        let yes = market.token_info(Outcome::Yes);
        let no = market.token_info(Outcome::No);
        assert_eq!((yes.name.as_str(), yes.symbol.as_str()), ("Yes Share", "YES"));
        assert_eq!((no.name.as_str(), no.symbol.as_str()), ("No Share", "NO"));
    }

    #[test]
    fn test_add_liquidity_mints_requested_amounts() {
        let (market, _clock) = create_test_market();
        let lp = test_address(1);

        market
            .add_liquidity(&lp, 1000 * ONE, 1000 * ONE, 1000 * ONE)
            .unwrap();

        assert_eq!(market.balance_of(Outcome::Yes, &lp), 1000 * ONE);
        assert_eq!(market.balance_of(Outcome::No, &lp), 1000 * ONE);
        assert_eq!(market.collateral_pool(), 1000 * ONE);
        assert_eq!(market.liquidity_of(&lp), 1000 * ONE);
        assert_eq!(market.events()[0].name(), "LiquidityAdded");
    }

    #[test]
    fn test_add_liquidity_prices_tokens_like_a_buy() {
        let (market, _clock) = create_test_market();
        let lp = test_address(1);

        // Both sides at 0.5: 4 YES + 2 NO cost 3
        let err = market
            .add_liquidity(&lp, 4 * ONE, 2 * ONE, 3 * ONE - 1)
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::InsufficientCollateral { required, provided }
                if required == 3 * ONE && provided == 3 * ONE - 1
        ));
        market.add_liquidity(&lp, 4 * ONE, 2 * ONE, 3 * ONE).unwrap();
        assert_eq!(market.collateral_pool(), 3 * ONE);
    }

    #[test]
    fn test_dust_deposit_cannot_mint_claims() {
        let (market, _clock) = create_test_market();
        let victim = test_address(2);
        let attacker = test_address(3);
        market.buy_yes(&victim, 10 * ONE).unwrap();
        let events = market.events().len();

        assert!(matches!(
            market.add_liquidity(&attacker, 1_000_000_000 * ONE, 0, 1),
            Err(MarketError::InsufficientCollateral { provided: 1, .. })
        ));
        assert!(matches!(
            market.add_liquidity(&attacker, 1_000_000_000 * ONE, 1_000_000_000 * ONE, 1),
            Err(MarketError::InsufficientCollateral { .. })
        ));

        assert_eq!(market.collateral_pool(), 10 * ONE);
        assert_eq!(market.balance_of(Outcome::Yes, &attacker), 0);
        assert_eq!(market.balance_of(Outcome::No, &attacker), 0);
        assert_eq!(market.liquidity_of(&attacker), 0);
        assert_eq!(market.events().len(), events);
    }

    #[test]
    fn test_balanced_liquidity_keeps_prices() {
        let (market, _clock) = create_test_market();
        market
            .add_liquidity(&test_address(1), 10 * ONE, 10 * ONE, 10 * ONE)
            .unwrap();
        let before = market.yes_price().unwrap();

        market
            .add_liquidity(&test_address(2), 5 * ONE, 5 * ONE, 5 * ONE)
            .unwrap();
        assert_eq!(market.yes_price().unwrap(), before);
    }

    #[test]
    fn test_proportional_liquidity_keeps_unbalanced_prices() {
        let (market, _clock) = create_test_market();
        market
            .add_liquidity(&test_address(1), 10 * ONE, 20 * ONE, 15 * ONE)
            .unwrap();
        let yes_before = market.yes_price().unwrap();
        let no_before = market.no_price().unwrap();
        assert_eq!(yes_before, 666_666_666_666_666_666);

        market
            .add_liquidity(&test_address(2), 5 * ONE, 10 * ONE, 7 * ONE)
            .unwrap();
        assert_eq!(market.yes_price().unwrap(), yes_before);
        assert_eq!(market.no_price().unwrap(), no_before);
    }

    #[test]
    fn test_add_liquidity_rejects_zero() {
        let (market, _clock) = create_test_market();
        let lp = test_address(1);
        assert!(matches!(
            market.add_liquidity(&lp, 0, 0, ONE),
            Err(MarketError::ZeroAmount)
        ));
        assert!(matches!(
            market.add_liquidity(&lp, ONE, ONE, 0),
            Err(MarketError::ZeroAmount)
        ));
        assert!(market.events().is_empty());
    }

    #[test]
    fn test_buy_yes_mints_and_moves_prices() {
        let (market, _clock) = create_test_market();
        let buyer = test_address(2);
        let yes_before = market.yes_price().unwrap();
        let no_before = market.no_price().unwrap();

        let shares = market.buy_yes(&buyer, ONE / 10).unwrap();

        assert!(shares > 0);
        assert_eq!(market.balance_of(Outcome::Yes, &buyer), shares);
        assert_eq!(market.collateral_pool(), ONE / 10);
        assert!(market.yes_price().unwrap() < yes_before);
        assert!(market.no_price().unwrap() > no_before);
        assert_eq!(market.events()[0].name(), "SharesBought");
    }

    #[test]
    fn test_buy_rejects_zero_value() {
        let (market, _clock) = create_test_market();
        assert!(matches!(
            market.buy_no(&test_address(2), 0),
            Err(MarketError::ZeroAmount)
        ));
    }

    #[test]
    fn test_user_position() {
        let (market, _clock) = create_test_market();
        let buyer = test_address(2);
        market.buy_yes(&buyer, ONE / 2).unwrap();

        let position = market.user_position(&buyer);
        assert!(position.yes_balance > 0);
        assert_eq!(position.no_balance, 0);
        assert_eq!(position.total_wagered, ONE / 2);
    }

    #[test]
    fn test_remove_liquidity_pays_proportional_share() {
        let (market, _clock) = create_test_market();
        let lp = test_address(1);
        market.add_liquidity(&lp, 100 * ONE, 100 * ONE, 100 * ONE).unwrap();

        let payout = market.remove_liquidity(&lp, 50 * ONE, 50 * ONE).unwrap();

        assert_eq!(payout, 50 * ONE);
        assert_eq!(market.collateral_pool(), 50 * ONE);
        assert_eq!(market.balance_of(Outcome::Yes, &lp), 50 * ONE);
        assert_eq!(market.liquidity_of(&lp), 50 * ONE);
        assert_eq!(market.total_paid_out(), 50 * ONE);
    }

    #[test]
    fn test_remove_liquidity_insufficient_balance() {
        let (market, _clock) = create_test_market();
        let lp = test_address(1);
        market.add_liquidity(&lp, 10 * ONE, 10 * ONE, 10 * ONE).unwrap();

        let err = market.remove_liquidity(&lp, 11 * ONE, 11 * ONE).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientBalance { .. }));
        assert_eq!(market.collateral_pool(), 10 * ONE);
        assert_eq!(market.balance_of(Outcome::Yes, &lp), 10 * ONE);
    }

    #[test]
    fn test_one_sided_burn_is_rejected() {
        let (market, _clock) = create_test_market();
        let trader = test_address(2);
        let shares = market.buy_yes(&trader, 10 * ONE).unwrap();

        assert!(matches!(
            market.remove_liquidity(&trader, shares, 0),
            Err(MarketError::UnmatchedPairs { no: 0, .. })
        ));
        assert_eq!(market.collateral_pool(), 10 * ONE);
        assert_eq!(market.balance_of(Outcome::Yes, &trader), shares);
        assert_eq!(market.total_paid_out(), 0);
    }

    #[test]
    fn test_pair_withdrawal_does_not_dilute_holders() {
        let (market, _clock) = create_test_market();
        let (victim, trader) = (test_address(2), test_address(3));
        market.buy_yes(&victim, 10 * ONE).unwrap();
        market.buy_no(&test_address(4), ONE).unwrap();
        market.buy_no(&trader, ONE).unwrap();
        market.buy_yes(&trader, ONE).unwrap();

        // Value of one winning token under each outcome
        let per_token = |side| {
            pricing::mul_div(market.collateral_pool(), ONE, market.total_supply(side)).unwrap()
        };
        let (yes_before, no_before) = (per_token(Outcome::Yes), per_token(Outcome::No));

        let pairs = market
            .balance_of(Outcome::Yes, &trader)
            .min(market.balance_of(Outcome::No, &trader));
        let payout = market.remove_liquidity(&trader, pairs, pairs).unwrap();

        assert!(payout < 2 * ONE, "withdrew {payout} after spending 2 units");
        assert!(per_token(Outcome::Yes) >= yes_before);
        assert!(per_token(Outcome::No) >= no_before);
    }

    #[test]
    fn test_resolve_access_and_timing() {
        let (market, clock) = create_test_market();
        let admin = test_address(0xad);

        assert!(matches!(
            market.resolve(&admin, Outcome::Yes),
            Err(MarketError::InvalidTiming(_))
        ));

        clock.set(TEST_DEADLINE);
        assert_eq!(market.status_line(), "Awaiting resolution");
        assert!(matches!(
            market.resolve(&test_address(1), Outcome::Yes),
            Err(MarketError::Unauthorized(_))
        ));

        assert_eq!(market.resolve(&admin, Outcome::Yes).unwrap(), Outcome::Yes);
        assert_eq!(market.state(), MarketState::Resolved(Outcome::Yes));
        assert_eq!(market.status_line(), "Resolved - Yes won");

        assert!(matches!(
            market.resolve(&admin, Outcome::No),
            Err(MarketError::AlreadyResolved)
        ));
        assert_eq!(market.winning_outcome(), Some(Outcome::Yes));
    }

    #[test]
    fn test_trading_closed_after_resolution() {
        let (market, clock) = create_test_market();
        let user = test_address(1);
        market.add_liquidity(&user, ONE, ONE, ONE).unwrap();
        clock.set(TEST_DEADLINE);
        market.resolve(&test_address(0xad), Outcome::No).unwrap();

        assert!(matches!(
            market.buy_yes(&user, ONE),
            Err(MarketError::AlreadyResolved)
        ));
        assert!(matches!(
            market.add_liquidity(&user, ONE, ONE, ONE),
            Err(MarketError::AlreadyResolved)
        ));
        assert!(matches!(
            market.remove_liquidity(&user, ONE, ONE),
            Err(MarketError::AlreadyResolved)
        ));
    }

    #[test]
    fn test_redeem_before_resolution() {
        let (market, _clock) = create_test_market();
        let user = test_address(1);
        market.buy_yes(&user, ONE).unwrap();
        assert!(matches!(
            market.redeem(&user),
            Err(MarketError::MarketNotResolved)
        ));
    }

    #[test]
    fn test_redeem_pays_pro_rata_and_leaves_dust() {
        let (market, clock) = create_test_market();
        let (a, b, c) = (test_address(1), test_address(2), test_address(3));
        market.buy_yes(&a, ONE).unwrap();
        market.buy_yes(&b, 2 * ONE).unwrap();
        market.buy_no(&c, 3 * ONE).unwrap();

        clock.set(TEST_DEADLINE);
        market.resolve(&test_address(0xad), Outcome::Yes).unwrap();
        let basis = market.resolution_basis().unwrap();
        assert_eq!(basis.pool, 6 * ONE);

        let a_shares = market.balance_of(Outcome::Yes, &a);
        let b_shares = market.balance_of(Outcome::Yes, &b);
        let a_paid = market.redeem(&a).unwrap();
        let b_paid = market.redeem(&b).unwrap();

        assert_eq!(a_paid, a_shares * basis.pool / basis.winning_supply);
        assert_eq!(b_paid, b_shares * basis.pool / basis.winning_supply);
        assert!(a_paid + b_paid <= basis.pool);
        assert_eq!(market.collateral_pool(), basis.pool - a_paid - b_paid);
        assert_eq!(market.balance_of(Outcome::Yes, &a), 0);

        assert!(matches!(market.redeem(&a), Err(MarketError::NoWinningShares)));
        assert!(matches!(market.redeem(&c), Err(MarketError::NoWinningShares)));
    }

    #[test]
    fn test_set_resolver_config() {
        let (market, clock) = create_test_market();
        let admin = test_address(0xad);
        let config = ResolverConfig {
            price_feed: Some(test_address(0xf1)),
            oracle: Some(test_address(0xf2)),
        };

        assert!(matches!(
            market.set_resolver_config(&test_address(1), config.clone()),
            Err(MarketError::Unauthorized(_))
        ));
        market.set_resolver_config(&admin, config.clone()).unwrap();
        assert_eq!(market.resolver_config(), config);

        clock.set(TEST_DEADLINE);
        market.resolve(&admin, Outcome::Yes).unwrap();
        assert!(matches!(
            market.set_resolver_config(&admin, ResolverConfig::default()),
            Err(MarketError::AlreadyResolved)
        ));
    }

    #[test]
    fn test_snapshot_restore() {
        let (market, clock) = create_test_market();
        market.add_liquidity(&test_address(1), ONE, 2 * ONE, 2 * ONE).unwrap();
        market.buy_no(&test_address(2), ONE / 4).unwrap();

        let snapshot = market.snapshot();
        let restored = Market::from_snapshot(snapshot.clone(), clock).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.no_price().unwrap(), market.no_price().unwrap());
    }

    #[test]
    fn test_restore_rejects_insolvent_snapshot() {
        let (market, clock) = create_test_market();
        market.buy_no(&test_address(2), ONE).unwrap();

        let mut snapshot = market.snapshot();
        snapshot.collateral_pool += 1;
        assert!(matches!(
            Market::from_snapshot(snapshot, clock),
            Err(MarketError::InvalidMarket(_))
        ));
    }

    #[test]
    fn test_outcome_parsing() {
        assert_eq!("YES".parse::<Outcome>().unwrap(), Outcome::Yes);
        assert_eq!("n".parse::<Outcome>().unwrap(), Outcome::No);
        assert!("maybe".parse::<Outcome>().is_err());
        assert_eq!(Outcome::Yes.opposite(), Outcome::No);
    }
}
