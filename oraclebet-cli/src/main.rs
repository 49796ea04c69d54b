//! # OracleBet CLI
//!
//! Command-line interface for creating, trading, resolving and redeeming
//! binary prediction markets. State is kept in a JSON file between runs.

mod commands;
mod config;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use oraclebet_core::{Address, Outcome};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "oraclebet")]
#[command(about = "Binary Yes/No prediction markets with AMM pricing")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// State file, overrides the configured path
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,
    /// Address acting as the caller
    #[arg(long, global = true)]
    pub from: Option<Address>,
    /// Override the current time (Unix seconds)
    #[arg(long, global = true)]
    pub now: Option<u64>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new prediction market
    Create {
        /// Market question
        #[arg(short, long)]
        title: String,
        /// Longer description of the resolution criteria
        #[arg(short, long, default_value = "")]
        description: String,
        /// Resolution deadline (Unix seconds, RFC 3339 or YYYY-MM-DD)
        #[arg(long, conflicts_with = "days", required_unless_present = "days")]
        deadline: Option<String>,
        /// Resolution deadline as days from now
        #[arg(long)]
        days: Option<u64>,
    },
    /// List all markets
    List,
    /// Show market information
    Info {
        /// Market address
        market: Address,
    },
    /// Buy Yes or No shares
    Buy {
        /// Market address
        market: Address,
        /// Side to buy (yes or no)
        side: Outcome,
        /// Collateral to spend, in whole units (e.g. 0.5)
        amount: String,
    },
    /// Deposit collateral and receive shares of both sides at current prices
    AddLiquidity {
        /// Market address
        market: Address,
        /// Yes shares to mint
        #[arg(long)]
        yes: String,
        /// No shares to mint
        #[arg(long)]
        no: String,
        /// Collateral to deposit
        #[arg(long)]
        value: String,
    },
    /// Burn matched Yes/No pairs for a share of the pool
    RemoveLiquidity {
        /// Market address
        market: Address,
        /// Pairs to burn (one YES and one NO each)
        pairs: String,
    },
    /// Show an address's position in a market
    Position {
        /// Market address
        market: Address,
        /// Holder (defaults to --from)
        #[arg(long)]
        of: Option<Address>,
    },
    /// Show current Yes/No prices
    Prices {
        /// Market address
        market: Address,
    },
    /// Show a market's event log
    Events {
        /// Market address
        market: Address,
    },
    /// Resolve a market (admin only)
    Resolve {
        /// Market address
        market: Address,
        /// Winning outcome, when resolving by hand
        #[arg(required_unless_present = "attestation")]
        outcome: Option<Outcome>,
        /// Oracle attestation JSON, as printed by `attest`
        #[arg(long, requires = "oracle_pubkey", conflicts_with = "outcome")]
        attestation: Option<String>,
        /// Oracle x-only public key (hex)
        #[arg(long)]
        oracle_pubkey: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Redeem winning shares
    Redeem {
        /// Market address
        market: Address,
    },
    /// Store price-feed / oracle references (admin only)
    SetResolver {
        /// Market address
        market: Address,
        /// Price-feed address
        #[arg(long)]
        price_feed: Option<Address>,
        /// Oracle address
        #[arg(long)]
        oracle: Option<Address>,
    },
    /// Sign an outcome as an oracle
    Attest {
        /// Market address
        market: Address,
        /// Outcome to attest
        outcome: Outcome,
        /// Oracle secret key (hex)
        #[arg(long)]
        secret_key: String,
    },
    /// Create the sample markets
    Seed,
    /// Derive an address from a secp256k1 secret key
    Address {
        /// Secret key (hex)
        secret_key: String,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    config.logging.init();

    commands::run(cli, &config)
}
