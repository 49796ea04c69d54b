//! Recipients of outbound value transfers.

use crate::{error::Result, Address, Amount};

/// Anything a market can pay collateral to.
///
/// `receive` runs after the market has committed its own bookkeeping. It may
/// call back into the market (a contract-like recipient would); mutating calls
/// made from inside `receive` are rejected with `ReentrancyDetected`, as are
/// calls other threads make while the payout is running. An error
/// returned from `receive` rejects the transfer and the paying operation is
/// rolled back.
pub trait Account {
    fn address(&self) -> Address;

    fn receive(&self, amount: Amount) -> Result<()>;
}

/// A bare address behaves like an externally-owned account: it accepts every
/// transfer and runs no code.
impl Account for Address {
    fn address(&self) -> Address {
        *self
    }

    fn receive(&self, _amount: Amount) -> Result<()> {
        Ok(())
    }
}
