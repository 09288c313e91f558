use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use finfetch::config::{default_config_path, Config};
use finfetch::fetch::{Fetcher, Orchestrator, RateLimiter};
use finfetch::providers::{PropertyParams, QuoteFetcher, ValuationFetcher, WalletFetcher};

#[derive(Parser)]
#[command(name = "finfetch")]
#[command(about = "Concurrent fetcher for financial data points")]
struct Cli {
    /// Path to config file (defaults to ./finfetch.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)?;

    match cli.command {
        Some(Command::Config) => {
            println!("Config file: {}", config_path.display());
            println!("Ethereum wallets: {}", config.ethereum_wallets.len());
            println!("Stock symbols: {}", config.stock_symbols.len());
            println!("Properties: {}", config.properties.len());
            println!("Fetch timeout: {:?}", config.fetch.timeout);
        }
        None => run_fetch(&config).await?,
    }

    Ok(())
}

/// Build one fetcher per configured data point and run a single
/// orchestration pass, printing each outcome as it is known.
async fn run_fetch(config: &Config) -> Result<()> {
    config.validate()?;

    let limiter = Arc::new(if config.fetch.unlimited_rate {
        RateLimiter::unlimited()
    } else {
        RateLimiter::with_defaults()
    });

    let mut fetchers: Vec<Arc<dyn Fetcher>> = Vec::new();

    for wallet in &config.ethereum_wallets {
        fetchers.push(Arc::new(
            WalletFetcher::new(
                config.etherscan_api_key.as_str(),
                wallet.as_str(),
                Arc::clone(&limiter),
            )
            .with_base_url(config.etherscan_base_url.as_str()),
        ));
    }

    for symbol in &config.stock_symbols {
        fetchers.push(Arc::new(
            QuoteFetcher::new(
                config.alphavantage_api_key.as_str(),
                symbol.as_str(),
                Arc::clone(&limiter),
            )
            .with_base_url(config.alphavantage_base_url.as_str()),
        ));
    }

    for property in &config.properties {
        let params = PropertyParams {
            address: property.address.clone(),
            property_type: property.property_type.clone(),
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            square_footage: property.square_footage,
        };
        fetchers.push(Arc::new(
            ValuationFetcher::new(
                config.rentcast_api_key.as_str(),
                params,
                Arc::clone(&limiter),
            )
            .with_base_url(config.rentcast_base_url.as_str()),
        ));
    }

    let orchestrator = Orchestrator::new(fetchers);
    let outcomes = orchestrator.run(Some(config.fetch.timeout)).await?;

    for outcome in outcomes {
        match outcome.result {
            Ok(value) => println!("{}: ${:.2}", outcome.key, value),
            Err(err) => println!("{}: ERROR - {err}", outcome.key),
        }
    }

    Ok(())
}
