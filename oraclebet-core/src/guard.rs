//! Per-market reentrancy lock.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{error::Result, MarketError};

/// Scoped hold on a market's "entered" flag; clears it on drop.
///
/// A second acquisition while the first is alive fails with
/// `ReentrancyDetected` instead of blocking. The flag is not tied to a thread:
/// the same error covers a nested call from a payout recipient and a call from
/// another thread that arrives while an operation is in progress.
#[must_use]
pub(crate) struct EntryGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> EntryGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| MarketError::ReentrancyDetected)?;
        Ok(Self { flag })
    }
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
