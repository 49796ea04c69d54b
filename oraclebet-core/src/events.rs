//! Events emitted by markets and the registry.
//!
//! Each market keeps its own append-only log; the registry never reads it.

use serde::{Deserialize, Serialize};

use crate::{resolver::ResolverConfig, Address, Amount, Outcome};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum MarketEvent {
    LiquidityAdded {
        provider: Address,
        yes_amount: Amount,
        no_amount: Amount,
        value: Amount,
    },
    LiquidityRemoved {
        provider: Address,
        yes_amount: Amount,
        no_amount: Amount,
        payout: Amount,
    },
    /// A trade against the AMM (the dApp calls this a bet)
    SharesBought {
        buyer: Address,
        side: Outcome,
        value: Amount,
        shares: Amount,
        price: u128,
    },
    MarketResolved {
        outcome: Outcome,
        pool: Amount,
        winning_supply: Amount,
    },
    Redeemed {
        holder: Address,
        side: Outcome,
        shares: Amount,
        payout: Amount,
    },
    ResolverConfigured {
        config: ResolverConfig,
    },
}

impl MarketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MarketEvent::LiquidityAdded { .. } => "LiquidityAdded",
            MarketEvent::LiquidityRemoved { .. } => "LiquidityRemoved",
            MarketEvent::SharesBought { .. } => "SharesBought",
            MarketEvent::MarketResolved { .. } => "MarketResolved",
            MarketEvent::Redeemed { .. } => "Redeemed",
            MarketEvent::ResolverConfigured { .. } => "ResolverConfigured",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    MarketCreated {
        market: Address,
        index: u64,
        creator: Address,
        title: String,
    },
}
