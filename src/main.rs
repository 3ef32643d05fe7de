//! tickwatch CLI
//!
//! Signs in as `WATCHLIST_USER_ID` (or `--user`), runs one command against
//! the stored watchlist and exits. No background timer runs here; see the
//! `server` binary for that.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::str::FromStr;
use tickwatch::application::sync_engine::{RefreshOutcome, RefreshTrigger};
use tickwatch::application::system::Application;
use tickwatch::config::Config;
use tickwatch::domain::market::conversion::ConversionRequest;
use tracing::{Level, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Watchlist sync and currency conversion", long_about = None)]
struct Cli {
    /// User whose watchlist to operate on (overrides WATCHLIST_USER_ID)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the watchlist with fresh prices
    List {
        /// Also value every price in this currency
        #[arg(short, long)]
        currency: Option<String>,
    },
    /// Start tracking a symbol (6-digit codes resolve to .KS)
    Add { symbol: String },
    /// Stop tracking a symbol
    Remove { symbol: String },
    /// Refresh every tracked symbol now
    Refresh,
    /// Convert an amount between currencies
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    /// Show the rate table for a base currency
    Rates {
        #[arg(short, long)]
        base: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Keep stdout for command output
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let app = Application::build(config, false).await?;
    if let Some(user) = &cli.user {
        app.identity.authenticate(user.clone());
    }

    match cli.command {
        Commands::Convert { amount, from, to } => {
            let amount = Decimal::from_str(amount.trim())
                .with_context(|| format!("Invalid amount: {}", amount))?;
            let request = ConversionRequest::new(amount, &from, &to)?;
            let result = app.conversion.convert(&request).await;
            println!("{} {} = {} {}", request.amount, request.from, result, request.to);
        }
        Commands::Rates { base } => {
            let base = base.unwrap_or_else(|| app.conversion.base().to_string());
            let table = app.conversion.rate_table(&base).await?;
            println!("1 {} (as of {})", table.base, table.fetched_at.to_rfc3339());
            for code in table.currencies() {
                if let Some(rate) = table.rate(&code) {
                    println!("  {:<4} {}", code, rate);
                }
            }
        }
        command => run_watchlist_command(&app, command).await?,
    }

    Ok(())
}

async fn run_watchlist_command(app: &Application, command: Commands) -> Result<()> {
    let engine = app
        .session
        .sign_in()
        .await
        .context("Sign in with --user or WATCHLIST_USER_ID")?;

    match command {
        Commands::List { currency } => {
            let watchlist = engine.store().snapshot().await;
            if watchlist.is_empty() {
                println!("Watchlist is empty.");
            }

            let valued = match &currency {
                Some(target) => Some(
                    app.conversion
                        .value_instruments(watchlist.instruments(), &target.to_uppercase())
                        .await,
                ),
                None => None,
            };

            for (idx, instrument) in watchlist.instruments().iter().enumerate() {
                let mut line = format!(
                    "{:<10} {:>14} {:>9}  H {} L {}  vol {}",
                    instrument.symbol,
                    instrument.price_label(),
                    instrument.change_percent_label(),
                    instrument.day_high,
                    instrument.day_low,
                    instrument.volume
                );
                if let (Some(values), Some(target)) = (&valued, &currency)
                    && let Some((_, value)) = values.get(idx)
                {
                    line.push_str(&format!("  = {} {}", value, target.to_uppercase()));
                }
                println!("{}", line);
            }
        }
        Commands::Add { symbol } => {
            let outcome = engine.add_symbol(&symbol).await?;
            if outcome.changed {
                println!("Added {}", outcome.symbol);
            } else {
                println!("{} is already tracked", outcome.symbol);
            }
            if let Some(e) = outcome.persistence_error {
                warn!("{}", e);
            }
        }
        Commands::Remove { symbol } => {
            let outcome = engine.remove_symbol(&symbol).await?;
            if outcome.changed {
                println!("Removed {}", outcome.symbol);
            } else {
                println!("{} was not tracked", symbol.trim().to_uppercase());
            }
            if let Some(e) = outcome.persistence_error {
                warn!("{}", e);
            }
        }
        Commands::Refresh => match engine.refresh(RefreshTrigger::Manual).await {
            RefreshOutcome::Skipped => println!("A refresh is already running."),
            RefreshOutcome::Closed => println!("Session has ended."),
            RefreshOutcome::Completed(report) => {
                println!(
                    "Refreshed {}/{} symbols",
                    report.updated.len(),
                    report.requested
                );
                for failure in &report.failed {
                    println!("  {}", failure);
                }
                if let Some(e) = report.persistence_error {
                    warn!("{}", e);
                }
            }
        },
        Commands::Convert { .. } | Commands::Rates { .. } => {}
    }

    app.session.sign_out().await;
    Ok(())
}
