//! # Market Registry
//!
//! Creates markets and keeps the directory of every market it created, in
//! creation order. The registry never touches a market's pool or tokens after
//! creating it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::{
    clock::Clock,
    error::Result,
    events::RegistryEvent,
    market::{Market, MarketParams},
    snapshot::RegistrySnapshot,
    Address, MarketError,
};

/// Factory and directory of markets.
#[derive(Debug)]
pub struct MarketRegistry {
    address: Address,
    clock: Arc<dyn Clock>,
    /// Creation order, append-only
    markets: Vec<Arc<Market>>,
    /// Address -> position in `markets`
    index: HashMap<Address, usize>,
    nonce: u64,
    events: Vec<RegistryEvent>,
}

impl MarketRegistry {
    pub fn new(address: Address, clock: Arc<dyn Clock>) -> Self {
        Self {
            address,
            clock,
            markets: Vec::new(),
            index: HashMap::new(),
            nonce: 0,
            events: Vec::new(),
        }
    }

    /// Create a new open market administered by `caller`.
    ///
    /// # Arguments
    /// * `caller` - Creator, becomes the market's admin
    /// * `title` - Market question
    /// * `description` - Free-form details
    /// * `resolution_deadline` - Unix timestamp, must be in the future
    ///
    /// # Returns
    /// The address of the new market
    pub fn create_market(
        &mut self,
        caller: &Address,
        title: impl Into<String>,
        description: impl Into<String>,
        resolution_deadline: u64,
    ) -> Result<Address> {
        let address = Address::derive(&self.address, self.nonce);
        let index = self.markets.len() as u64;
        let market = Market::new(
            address,
            index,
            MarketParams {
                title: title.into(),
                description: description.into(),
                resolution_deadline,
                admin: *caller,
            },
            self.clock.clone(),
        )?;

        if self.index.contains_key(&address) {
            return Err(MarketError::InvalidMarket(format!(
                "Derived address {address} is already registered"
            )));
        }

        self.nonce += 1;
        self.events.push(RegistryEvent::MarketCreated {
            market: address,
            index,
            creator: *caller,
            title: market.title().to_string(),
        });
        info!(
            registry = %self.address,
            market = %address,
            index,
            creator = %caller,
            title = market.title(),
            resolution_deadline,
            "Market created"
        );

        self.index.insert(address, self.markets.len());
        self.markets.push(Arc::new(market));
        Ok(address)
    }

    /// Addresses of every market, in creation order
    pub fn all_markets(&self) -> Vec<Address> {
        self.markets.iter().map(|market| market.address()).collect()
    }

    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    /// True iff `address` was created by this registry
    pub fn is_market(&self, address: &Address) -> bool {
        self.index.contains_key(address)
    }

    pub fn market(&self, address: &Address) -> Option<Arc<Market>> {
        self.index
            .get(address)
            .map(|&position| self.markets[position].clone())
    }

    /// Like [`MarketRegistry::market`], failing with `UnknownMarket`.
    pub fn get(&self, address: &Address) -> Result<Arc<Market>> {
        self.market(address)
            .ok_or_else(|| MarketError::UnknownMarket(address.to_string()))
    }

    /// Markets in creation order
    pub fn markets(&self) -> impl Iterator<Item = &Arc<Market>> {
        self.markets.iter()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            address: self.address,
            nonce: self.nonce,
            markets: self.markets.iter().map(|market| market.snapshot()).collect(),
            events: self.events.clone(),
        }
    }

    /// Rebuild a registry and its markets from a snapshot.
    pub fn restore(snapshot: RegistrySnapshot, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut registry = Self::new(snapshot.address, clock.clone());

        for (position, market) in snapshot.markets.into_iter().enumerate() {
            if market.index != position as u64 {
                return Err(MarketError::InvalidMarket(format!(
                    "Market {} has index {} but is stored at position {}",
                    market.address, market.index, position
                )));
            }
            let market = Market::from_snapshot(market, clock.clone())?;
            if registry.index.insert(market.address(), position).is_some() {
                return Err(MarketError::InvalidMarket(format!(
                    "Market {} appears twice",
                    market.address()
                )));
            }
            registry.markets.push(Arc::new(market));
        }

        if snapshot.nonce < registry.markets.len() as u64 {
            return Err(MarketError::InvalidMarket(format!(
                "Nonce {} is behind {} created markets",
                snapshot.nonce,
                registry.markets.len()
            )));
        }
        registry.nonce = snapshot.nonce;
        registry.events = snapshot.events;
        Ok(registry)
    }
}
