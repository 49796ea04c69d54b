//! Serializable copies of registry and market state, used for persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    events::{MarketEvent, RegistryEvent},
    market::ResolutionBasis,
    resolver::ResolverConfig,
    token::ClaimToken,
    Address, Amount,
};

/// Full state of one market.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub address: Address,
    pub index: u64,
    pub title: String,
    pub description: String,
    pub resolution_deadline: u64,
    pub admin: Address,
    pub collateral_pool: Amount,
    pub total_received: Amount,
    pub total_paid_out: Amount,
    pub yes_token: ClaimToken,
    pub no_token: ClaimToken,
    #[serde(default)]
    pub wagered: BTreeMap<Address, Amount>,
    #[serde(default)]
    pub liquidity: BTreeMap<Address, Amount>,
    #[serde(default)]
    pub resolver_config: ResolverConfig,
    pub resolution: Option<ResolutionBasis>,
    #[serde(default)]
    pub events: Vec<MarketEvent>,
}

/// Full state of a registry and every market it created.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub address: Address,
    pub nonce: u64,
    /// In creation order
    pub markets: Vec<MarketSnapshot>,
    #[serde(default)]
    pub events: Vec<RegistryEvent>,
}
