//! Command execution.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use inquire::Confirm;
use oraclebet_core::{
    resolver::{oracle_pubkey, sign_outcome},
    utils::*,
    Address, Clock, ManualClock, Market, MarketEvent, MarketRegistry, OracleAttestation, Outcome,
    ResolverConfig, SignedOracleResolver, SystemClock,
};
use tracing::info;

use crate::{config::Config, store::Store, Cli, Commands};

/// Sample markets created by `seed`: title, description, days until deadline
const SAMPLE_MARKETS: [(&str, &str, u64); 3] = [
    (
        "MNT > $2 by Q1 2026?",
        "Will Mantle token price exceed $2 by end of Q1 2026?",
        90,
    ),
    (
        "Bitcoin hits $150k in 2026?",
        "Will BTC reach $150,000 at any point in 2026?",
        365,
    ),
    (
        "Mantle TVL > $1B?",
        "Will Mantle Network TVL exceed $1 billion?",
        180,
    ),
];

/// Execute a parsed command line against the configured state file.
pub fn run(cli: Cli, config: &Config) -> Result<()> {
    let clock: Arc<dyn Clock> = match cli.now {
        Some(now) => Arc::new(ManualClock::new(now)),
        None => Arc::new(SystemClock),
    };
    let store = Store::new(cli.state.clone().unwrap_or_else(|| config.state_path.clone()));
    let mut registry = store.load(clock.clone())?;
    let caller = cli.from;

    let mutated = execute(cli.command, &mut registry, caller, clock.as_ref())?;
    if mutated {
        store.save(&registry)?;
        info!(path = %store.path().display(), "State saved");
    }
    Ok(())
}

/// Run one command. Returns whether the registry changed.
fn execute(
    command: Commands,
    registry: &mut MarketRegistry,
    caller: Option<Address>,
    clock: &dyn Clock,
) -> Result<bool> {
    let require_caller = || caller.ok_or_else(|| anyhow!("This command needs --from <address>"));

    match command {
        Commands::Create {
            title,
            description,
            deadline,
            days,
        } => {
            let caller = require_caller()?;
            let deadline = match (deadline, days) {
                (Some(deadline), _) => parse_timestamp(&deadline)?,
                (None, Some(days)) => days_from(clock.now(), days),
                (None, None) => bail!("Either --deadline or --days is required"),
            };

            println!("{}", "Creating new prediction market...".green().bold());
            let address = registry.create_market(&caller, title, description, deadline)?;
            let market = registry.get(&address)?;

            println!();
            println!("{}", "Market Created Successfully!".green().bold());
            print_market(&market);
            Ok(true)
        }

        Commands::List => {
            if registry.market_count() == 0 {
                println!("{}", "No markets yet. Create one with `oraclebet create`.".yellow());
                return Ok(false);
            }
            println!(
                "{}",
                format!("{} market(s)", registry.market_count()).green().bold()
            );
            for market in registry.markets() {
                println!(
                    "{:>3}  {}  {}  {}  {}",
                    market.index(),
                    market.address().to_string().cyan(),
                    format_price(market.yes_price()?).green(),
                    market.title(),
                    market.status_line().bright_black()
                );
            }
            Ok(false)
        }

        Commands::Info { market } => {
            print_market(&*registry.get(&market)?);
            Ok(false)
        }

        Commands::Buy {
            market,
            side,
            amount,
        } => {
            let caller = require_caller()?;
            let market = registry.get(&market)?;
            let value = parse_amount(&amount)?;

            let shares = market
                .buy(&caller, side, value)
                .with_context(|| format!("Failed to buy {side} shares"))?;

            println!(
                "{}: {} {} shares for {}",
                "Bought".green().bold(),
                format_amount(shares).cyan(),
                side.to_string().yellow(),
                format_amount(value)
            );
            print_prices(&market)?;
            Ok(true)
        }

        Commands::AddLiquidity {
            market,
            yes,
            no,
            value,
        } => {
            let caller = require_caller()?;
            let market = registry.get(&market)?;
            let (yes, no, value) = (parse_amount(&yes)?, parse_amount(&no)?, parse_amount(&value)?);

            market.add_liquidity(&caller, yes, no, value)?;

            println!(
                "{}: {} collateral for {} YES + {} NO",
                "Liquidity added".green().bold(),
                format_amount(value).cyan(),
                format_amount(yes),
                format_amount(no)
            );
            Ok(true)
        }

        Commands::RemoveLiquidity { market, pairs } => {
            let caller = require_caller()?;
            let market = registry.get(&market)?;
            let pairs = parse_amount(&pairs)?;
            let payout = market.remove_liquidity(&caller, pairs, pairs)?;

            println!(
                "{}: received {}",
                "Liquidity removed".green().bold(),
                format_amount(payout).cyan()
            );
            Ok(true)
        }

        Commands::Position { market, of } => {
            let holder = match of {
                Some(holder) => holder,
                None => require_caller()?,
            };
            let market = registry.get(&market)?;
            let position = market.user_position(&holder);

            println!("{}", format!("Position of {holder}").green().bold());
            println!("{}", "═".repeat(50).bright_black());
            println!("{}: {}", "Yes shares".yellow().bold(), format_amount(position.yes_balance));
            println!("{}: {}", "No shares".yellow().bold(), format_amount(position.no_balance));
            println!(
                "{}: {}",
                "Total wagered".yellow().bold(),
                format_amount(position.total_wagered)
            );
            println!(
                "{}: {}",
                "Liquidity provided".yellow().bold(),
                format_amount(market.liquidity_of(&holder))
            );
            Ok(false)
        }

        Commands::Prices { market } => {
            print_prices(&*registry.get(&market)?)?;
            Ok(false)
        }

        Commands::Events { market } => {
            let market = registry.get(&market)?;
            for (i, event) in market.events().iter().enumerate() {
                println!("{:>3}  {}", i, describe_event(event));
            }
            Ok(false)
        }

        Commands::Resolve {
            market,
            outcome,
            attestation,
            oracle_pubkey,
            force,
        } => {
            let caller = require_caller()?;
            let market = registry.get(&market)?;

            let resolved = match (attestation, oracle_pubkey) {
                (Some(attestation), Some(pubkey)) => {
                    let attestation: OracleAttestation = serde_json::from_str(&attestation)
                        .context("Attestation must be the JSON printed by `attest`")?;
                    confirm_resolution(&market, attestation.outcome, force)?;
                    let resolver = SignedOracleResolver::new(&pubkey, attestation)?;
                    market.resolve_with(&caller, &resolver)?
                }
                _ => {
                    let outcome = outcome.ok_or_else(|| anyhow!("An outcome is required"))?;
                    confirm_resolution(&market, outcome, force)?;
                    market.resolve(&caller, outcome)?
                }
            };

            println!(
                "{}: {} won",
                "Market resolved".green().bold(),
                resolved.to_string().cyan().bold()
            );
            Ok(true)
        }

        Commands::Redeem { market } => {
            let caller = require_caller()?;
            let market = registry.get(&market)?;
            let payout = market.redeem(&caller)?;

            println!(
                "{}: {} paid to {}",
                "Redeemed".green().bold(),
                format_amount(payout).cyan(),
                caller
            );
            Ok(true)
        }

        Commands::SetResolver {
            market,
            price_feed,
            oracle,
        } => {
            let caller = require_caller()?;
            let market = registry.get(&market)?;
            market.set_resolver_config(&caller, ResolverConfig { price_feed, oracle })?;

            println!("{}", "Resolver configuration updated".green().bold());
            Ok(true)
        }

        Commands::Attest {
            market,
            outcome,
            secret_key,
        } => {
            let market = registry.get(&market)?;
            let secret = hex::decode(secret_key.trim_start_matches("0x"))
                .context("Secret key must be hex")?;
            let attestation = sign_outcome(
                &secret,
                &market.address(),
                outcome,
                market.resolution_deadline(),
            )?;

            println!("{}: {}", "Oracle pubkey".yellow().bold(), oracle_pubkey(&secret)?);
            println!("{}", serde_json::to_string(&attestation)?);
            Ok(false)
        }

        Commands::Seed => {
            let caller = require_caller()?;
            let now = clock.now();

            for (title, description, days) in SAMPLE_MARKETS {
                let address =
                    registry.create_market(&caller, title, description, days_from(now, days))?;
                println!(
                    "{}: {} {}",
                    "Created".green().bold(),
                    address.to_string().cyan(),
                    title
                );
            }
            Ok(true)
        }

        Commands::Address { secret_key } => {
            let secret = hex::decode(secret_key.trim_start_matches("0x"))
                .context("Secret key must be hex")?;
            let address = Address::from_secret_key(&secret)?;

            println!("{}: {}", "Address".green().bold(), address.to_string().cyan());
            println!("{}: {}", "Oracle pubkey".yellow().bold(), oracle_pubkey(&secret)?);
            Ok(false)
        }
    }
}

fn confirm_resolution(market: &Market, outcome: Outcome, force: bool) -> Result<()> {
    if force {
        return Ok(());
    }
    let confirmed = Confirm::new(&format!(
        "Resolve \"{}\" to {}? This cannot be undone.",
        market.title(),
        outcome
    ))
    .with_default(false)
    .prompt()?;
    if !confirmed {
        bail!("Resolution cancelled");
    }
    Ok(())
}

fn print_market(market: &Market) {
    println!("{}", "═".repeat(50).bright_black());
    println!("{}: {}", "Market".cyan().bold(), market.address());
    println!("{}: {}", "Index".yellow().bold(), market.index());
    println!("{}: {}", "Title".yellow().bold(), market.title());
    if !market.description().is_empty() {
        println!("{}: {}", "Description".yellow().bold(), market.description());
    }
    println!("{}: {}", "Admin".yellow().bold(), market.admin());
    println!(
        "{}: {}",
        "Resolution Time".yellow().bold(),
        format_timestamp(market.resolution_deadline())
    );
    println!(
        "{}: {}",
        "Collateral Pool".yellow().bold(),
        format_amount(market.collateral_pool())
    );
    for side in [Outcome::Yes, Outcome::No] {
        let token = market.token_info(side);
        println!(
            "{}: {} ({}), supply {}, {} holder(s)",
            format!("{side} token").yellow().bold(),
            token.name,
            token.symbol,
            format_amount(token.total_supply),
            token.holders
        );
    }
    if let (Ok(yes), Ok(no)) = (market.yes_price(), market.no_price()) {
        println!(
            "{}: Yes {} / No {}",
            "Prices".yellow().bold(),
            format_price(yes),
            format_price(no)
        );
    }
    let config = market.resolver_config();
    if config != ResolverConfig::default() {
        println!(
            "{}: price feed {}, oracle {}",
            "Resolver".yellow().bold(),
            config.price_feed.map_or("-".to_string(), |a| a.to_string()),
            config.oracle.map_or("-".to_string(), |a| a.to_string())
        );
    }
    println!("{}: {}", "Status".yellow().bold(), market.status_line());
    println!("{}", "═".repeat(50).bright_black());
}

fn print_prices(market: &Market) -> Result<()> {
    let (yes, no) = (market.yes_price()?, market.no_price()?);
    println!(
        "{}: {} ({})   {}: {} ({})",
        "Yes".green().bold(),
        format_price(yes),
        format_probability(yes),
        "No".red().bold(),
        format_price(no),
        format_probability(no)
    );
    Ok(())
}

fn describe_event(event: &MarketEvent) -> String {
    match event {
        MarketEvent::LiquidityAdded {
            provider,
            yes_amount,
            no_amount,
            value,
        } => format!(
            "LiquidityAdded {} deposited {} for {} YES + {} NO",
            provider.short(),
            format_amount(*value),
            format_amount(*yes_amount),
            format_amount(*no_amount)
        ),
        MarketEvent::LiquidityRemoved {
            provider,
            yes_amount,
            no_amount,
            payout,
        } => format!(
            "LiquidityRemoved {} burned {} YES + {} NO for {}",
            provider.short(),
            format_amount(*yes_amount),
            format_amount(*no_amount),
            format_amount(*payout)
        ),
        MarketEvent::SharesBought {
            buyer,
            side,
            value,
            shares,
            price,
        } => format!(
            "SharesBought {} paid {} for {} {} at {}",
            buyer.short(),
            format_amount(*value),
            format_amount(*shares),
            side,
            format_price(*price)
        ),
        MarketEvent::MarketResolved {
            outcome,
            pool,
            winning_supply,
        } => format!(
            "MarketResolved {} won, pool {} over {} shares",
            outcome,
            format_amount(*pool),
            format_amount(*winning_supply)
        ),
        MarketEvent::Redeemed {
            holder,
            side,
            shares,
            payout,
        } => format!(
            "Redeemed {} burned {} {} for {}",
            holder.short(),
            format_amount(*shares),
            side,
            format_amount(*payout)
        ),
        MarketEvent::ResolverConfigured { config } => format!(
            "ResolverConfigured price feed {:?}, oracle {:?}",
            config.price_feed.map(|a| a.short()),
            config.oracle.map(|a| a.short())
        ),
    }
}
