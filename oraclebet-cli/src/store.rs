//! JSON persistence of the registry between CLI invocations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use oraclebet_core::{Address, Clock, MarketRegistry, RegistrySnapshot};
use tracing::debug;

/// State file holding one registry snapshot.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry, or start an empty one if the file does not exist yet.
    pub fn load(&self, clock: Arc<dyn Clock>) -> Result<MarketRegistry> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file, starting empty registry");
            return Ok(MarketRegistry::new(default_registry_address(), clock));
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file {}", self.path.display()))?;
        let snapshot: RegistrySnapshot = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt state file {}", self.path.display()))?;
        let registry = MarketRegistry::restore(snapshot, clock)
            .with_context(|| format!("Invalid state in {}", self.path.display()))?;

        debug!(
            path = %self.path.display(),
            markets = registry.market_count(),
            "Loaded registry"
        );
        Ok(registry)
    }

    /// Write the registry atomically (temp file + rename).
    pub fn save(&self, registry: &MarketRegistry) -> Result<()> {
        let json = serde_json::to_string_pretty(&registry.snapshot())?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Saved registry");
        Ok(())
    }
}

/// Address of the registry created on first use
pub fn default_registry_address() -> Address {
    Address::derive(&Address::ZERO, 0)
}
