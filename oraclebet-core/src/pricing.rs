//! # Pricing
//!
//! Cost-function AMM for the two outcome tokens.
//!
//! The price of a side is the share of the *opposite* side in the outstanding
//! supply, smoothed by a virtual reserve `v` on both sides:
//!
//! ```text
//! price(Yes) = (no_supply  + v) / (yes_supply + no_supply + 2v)
//! price(No)  = (yes_supply + v) / (yes_supply + no_supply + 2v)
//! v          = max(0, V - min(yes_supply, no_supply))
//! ```
//!
//! The reserve only props up a thin book: it shrinks as the thinner side
//! grows and is gone once both sides hold at least `V`. From then on the price
//! depends only on the Yes/No ratio, so deposits in that ratio leave it
//! unchanged.
//!
//! Buying a side grows its supply, which lowers its own price and raises the
//! other side's. Both prices stay strictly inside (0, 1) and their sum never
//! exceeds 1. A buyer of `value` collateral receives `value / price` tokens.
//!
//! Payouts are pro-rata over the collateral pool, so no trade priced here can
//! ever promise more collateral than the pool holds.

use crate::{error::Result, Amount, MarketError, Outcome, ONE};

/// Fixed-point scale of prices: `PRICE_SCALE` represents 1.0
pub const PRICE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Virtual reserve of an empty book, one whole collateral unit
pub const VIRTUAL_LIQUIDITY: Amount = ONE;

/// Prices are clamped to `[MIN_PRICE, PRICE_SCALE - MIN_PRICE]` (0.1%)
pub const MIN_PRICE: u128 = PRICE_SCALE / 1_000;

/// Current price of `side` given both outstanding supplies.
pub fn price_of(side: Outcome, yes_supply: Amount, no_supply: Amount) -> Result<u128> {
    let reserve = VIRTUAL_LIQUIDITY.saturating_sub(yes_supply.min(no_supply));
    let opposite = match side {
        Outcome::Yes => no_supply,
        Outcome::No => yes_supply,
    };
    let numerator = opposite
        .checked_add(reserve)
        .ok_or(MarketError::Overflow)?;
    let denominator = yes_supply
        .checked_add(no_supply)
        .and_then(|total| total.checked_add(2 * reserve))
        .ok_or(MarketError::Overflow)?;

    let price = mul_div(numerator, PRICE_SCALE, denominator)?;
    Ok(price.clamp(MIN_PRICE, PRICE_SCALE - MIN_PRICE))
}

/// Tokens minted for `value` collateral at `price` (rounded down).
pub fn shares_for(value: Amount, price: u128) -> Result<Amount> {
    mul_div(value, PRICE_SCALE, price)
}

/// Collateral that `amount` tokens are worth at `price` (rounded up).
pub fn cost_of(amount: Amount, price: u128) -> Result<Amount> {
    mul_div_up(amount, price, PRICE_SCALE)
}

/// `a * b / c` rounded down, exact even when `a * b` exceeds 128 bits.
///
/// Fails with `Overflow` if `c` is zero or the quotient does not fit.
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128> {
    mul_div_rem(a, b, c).map(|(quotient, _)| quotient)
}

/// Like [`mul_div`], rounded up.
pub fn mul_div_up(a: u128, b: u128, c: u128) -> Result<u128> {
    let (quotient, rem) = mul_div_rem(a, b, c)?;
    if rem == 0 {
        return Ok(quotient);
    }
    quotient.checked_add(1).ok_or(MarketError::Overflow)
}

fn mul_div_rem(a: u128, b: u128, c: u128) -> Result<(u128, u128)> {
    if c == 0 {
        return Err(MarketError::Overflow);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok((product / c, product % c));
    }

    let (hi, lo) = widening_mul(a, b);
    if hi >= c {
        return Err(MarketError::Overflow);
    }

    // Binary long division of the 256-bit product; `rem < c` holds on entry
    // to every iteration.
    let mut rem = hi;
    let mut quotient: u128 = 0;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> bit) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= c {
            rem = rem.wrapping_sub(c);
            quotient |= 1;
        }
    }
    Ok((quotient, rem))
}

/// Full 256-bit product as `(high, low)` halves.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (ll & MASK) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}
