//! # Claim Tokens
//!
//! Fungible ledger for one outcome of one market. Only the owning market may
//! mint or burn; the minter is fixed when the token is created.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{error::Result, Address, Amount, MarketError};

/// Ledger of claims on one outcome of a market.
///
/// Invariant: the sum of all balances equals `total_supply`. Zero balances are
/// not stored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ClaimToken {
    name: String,
    symbol: String,
    minter: Address,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
}

impl ClaimToken {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, minter: Address) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            minter,
            total_supply: 0,
            balances: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The only address allowed to mint and burn
    pub fn minter(&self) -> Address {
        self.minter
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Number of addresses with a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Credit `amount` to `to`.
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: Amount) -> Result<()> {
        self.ensure_minter(caller)?;
        if amount == 0 {
            return Ok(());
        }

        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(MarketError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(MarketError::Overflow)?;

        self.total_supply = supply;
        self.balances.insert(*to, balance);
        Ok(())
    }

    /// Debit `amount` from `from`.
    pub fn burn(&mut self, caller: &Address, from: &Address, amount: Amount) -> Result<()> {
        self.ensure_minter(caller)?;
        let available = self.balance_of(from);
        if available < amount {
            return Err(MarketError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        if amount == 0 {
            return Ok(());
        }

        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, remaining);
        }
        // balance <= supply, so this cannot underflow
        self.total_supply -= amount;
        Ok(())
    }

    /// Check the supply invariant, used when loading persisted state.
    pub fn validate(&self) -> Result<()> {
        let mut sum: Amount = 0;
        for (holder, balance) in &self.balances {
            if *balance == 0 {
                return Err(MarketError::InvalidMarket(format!(
                    "{} holds a zero {} balance entry",
                    holder, self.symbol
                )));
            }
            sum = sum.checked_add(*balance).ok_or(MarketError::Overflow)?;
        }
        if sum != self.total_supply {
            return Err(MarketError::InvalidMarket(format!(
                "{} balances sum to {} but total supply is {}",
                self.symbol, sum, self.total_supply
            )));
        }
        Ok(())
    }

    fn ensure_minter(&self, caller: &Address) -> Result<()> {
        if *caller != self.minter {
            return Err(MarketError::Unauthorized(format!(
                "{} is not the minter of {}",
                caller, self.symbol
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn token() -> ClaimToken {
        ClaimToken::new("Yes Share", "YES", addr(0xaa))
    }

    #[test]
    fn test_metadata() {
        let token = token();
        assert_eq!(token.name(), "Yes Share");
        assert_eq!(token.symbol(), "YES");
        assert_eq!(token.minter(), addr(0xaa));
        assert_eq!(token.total_supply(), 0);
    }

    #[test]
    fn test_mint_and_burn() {
        let mut token = token();
        let minter = addr(0xaa);

        token.mint(&minter, &addr(1), 100).unwrap();
        token.mint(&minter, &addr(2), 50).unwrap();
        assert_eq!(token.total_supply(), 150);
        assert_eq!(token.balance_of(&addr(1)), 100);

        token.burn(&minter, &addr(1), 40).unwrap();
        assert_eq!(token.balance_of(&addr(1)), 60);
        assert_eq!(token.total_supply(), 110);
        token.validate().unwrap();
    }

    #[test]
    fn test_only_minter_can_mint_or_burn() {
        let mut token = token();
        let intruder = addr(1);

        assert!(matches!(
            token.mint(&intruder, &intruder, 10),
            Err(MarketError::Unauthorized(_))
        ));

        token.mint(&addr(0xaa), &intruder, 10).unwrap();
        assert!(matches!(
            token.burn(&intruder, &intruder, 10),
            Err(MarketError::Unauthorized(_))
        ));
        assert_eq!(token.balance_of(&intruder), 10);
    }

    #[test]
    fn test_burn_more_than_balance() {
        let mut token = token();
        let minter = addr(0xaa);
        token.mint(&minter, &addr(1), 5).unwrap();

        let err = token.burn(&minter, &addr(1), 6).unwrap_err();
        assert!(matches!(
            err,
            MarketError::InsufficientBalance {
                requested: 6,
                available: 5
            }
        ));
        assert_eq!(token.balance_of(&addr(1)), 5);
        assert_eq!(token.total_supply(), 5);
    }

    #[test]
    fn test_zero_balances_are_pruned() {
        let mut token = token();
        let minter = addr(0xaa);
        token.mint(&minter, &addr(1), 5).unwrap();
        token.burn(&minter, &addr(1), 5).unwrap();
        assert_eq!(token.holder_count(), 0);

        token.mint(&minter, &addr(2), 0).unwrap();
        assert_eq!(token.holder_count(), 0);
    }

    #[test]
    fn test_validate_detects_broken_supply() {
        let mut token = token();
        token.mint(&addr(0xaa), &addr(1), 5).unwrap();
        token.total_supply = 6;
        assert!(matches!(
            token.validate(),
            Err(MarketError::InvalidMarket(_))
        ));
    }
}
