//! CorrLab CLI: catalog, price, history, stats and correlation matrix commands.
//!
//! Commands:
//! - `stocks`: list the instrument catalog
//! - `price`: latest price for a symbol
//! - `history`: trailing price history for a symbol
//! - `stats`: average and sample standard deviation over a window
//! - `matrix`: pairwise correlation matrix, optionally exported as CSV

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corrlab_core::{
    CorrLabConfig, CorrelationMatrix, CorrelationMatrixBuilder, HttpProvider, Instrument,
    MarketDataGateway, RetryingCache,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "corrlab",
    about = "CorrLab CLI — cached market data and price correlations"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Upstream base URL (overrides config and CORRLAB_BASE_URL).
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the instrument catalog.
    Stocks,
    /// Latest price for a symbol.
    Price {
        symbol: String,
    },
    /// Price history over the trailing window.
    History {
        symbol: String,

        /// Window length in minutes. Defaults to matrix.window_minutes.
        #[arg(long)]
        minutes: Option<u32>,

        /// Print raw JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Average and standard deviation over the trailing window.
    Stats {
        symbol: String,

        /// Window length in minutes. Defaults to matrix.window_minutes.
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Pairwise correlation matrix.
    Matrix {
        /// Symbols to correlate. Defaults to the head of the catalog.
        symbols: Vec<String>,

        /// Window length in minutes. Defaults to matrix.window_minutes.
        #[arg(long)]
        minutes: Option<u32>,

        /// Maximum number of instruments. Defaults to matrix.limit.
        #[arg(long)]
        limit: Option<usize>,

        /// Also write the matrix to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CORRLAB_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref(), cli.base_url)?;
    let gateway = build_gateway(&config)?;

    match cli.command {
        Commands::Stocks => run_stocks(&gateway).await,
        Commands::Price { symbol } => run_price(&gateway, &symbol).await,
        Commands::History {
            symbol,
            minutes,
            json,
        } => {
            let minutes = minutes.unwrap_or(config.matrix.window_minutes);
            run_history(&gateway, &symbol, minutes, json).await
        }
        Commands::Stats { symbol, minutes } => {
            let minutes = minutes.unwrap_or(config.matrix.window_minutes);
            run_stats(&gateway, &symbol, minutes).await
        }
        Commands::Matrix {
            symbols,
            minutes,
            limit,
            csv,
            json,
        } => {
            let minutes = minutes.unwrap_or(config.matrix.window_minutes);
            let limit = limit.unwrap_or(config.matrix.limit);
            run_matrix(&gateway, symbols, minutes, limit, csv, json).await
        }
    }
}

fn load_config(path: Option<&PathBuf>, base_url: Option<String>) -> Result<CorrLabConfig> {
    let mut config = match path {
        Some(path) => CorrLabConfig::load(path)?,
        None => CorrLabConfig::default(),
    };

    if let Ok(url) = std::env::var("CORRLAB_BASE_URL") {
        let url = url.trim();
        if !url.is_empty() {
            config.provider.base_url = url.to_string();
        }
    }
    if let Some(url) = base_url {
        config.provider.base_url = url;
    }

    config.validate()?;
    Ok(config)
}

fn build_gateway(config: &CorrLabConfig) -> Result<MarketDataGateway> {
    let provider = HttpProvider::new(&config.provider)?;
    tracing::debug!(base_url = provider.base_url(), "using HTTP provider");
    let cache = RetryingCache::new(config.cache.clone());
    Ok(MarketDataGateway::new(Arc::new(provider), cache))
}

async fn run_stocks(gateway: &MarketDataGateway) -> Result<()> {
    let instruments = gateway.list_instruments().await?;
    println!("{:<10} NAME", "SYMBOL");
    for instrument in &instruments {
        println!("{:<10} {}", instrument.symbol, instrument.display_name);
    }
    println!("\n{} instruments", instruments.len());
    Ok(())
}

async fn run_price(gateway: &MarketDataGateway, symbol: &str) -> Result<()> {
    let point = gateway.get_latest_price(symbol).await?;
    println!("{symbol}: {:.4} (as of {})", point.price, point.timestamp.to_rfc3339());
    Ok(())
}

async fn run_history(
    gateway: &MarketDataGateway,
    symbol: &str,
    minutes: u32,
    json: bool,
) -> Result<()> {
    let history = gateway.get_history(symbol, minutes).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    if history.is_empty() {
        println!("No price points for {symbol} in the last {minutes} minutes");
        return Ok(());
    }
    for point in &history {
        println!("{}  {:.4}", point.timestamp.to_rfc3339(), point.price);
    }
    println!("\n{} points", history.len());
    Ok(())
}

async fn run_stats(gateway: &MarketDataGateway, symbol: &str, minutes: u32) -> Result<()> {
    let summary = gateway.get_summary(symbol, minutes).await?;
    println!("{symbol} over the last {minutes} minutes ({} points)", summary.count);
    println!("  Average:            {:.4}", summary.average);
    if summary.standard_deviation.is_nan() {
        println!("  Standard deviation: n/a");
    } else {
        println!("  Standard deviation: {:.4}", summary.standard_deviation);
    }
    Ok(())
}

async fn run_matrix(
    gateway: &MarketDataGateway,
    symbols: Vec<String>,
    minutes: u32,
    limit: usize,
    csv_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let builder = CorrelationMatrixBuilder::new(gateway);
    let matrix = if symbols.is_empty() {
        builder.build_for_catalog(minutes, limit).await?
    } else {
        let instruments: Vec<Instrument> = symbols
            .iter()
            .map(|s| Instrument::new(s.clone(), s.clone()))
            .collect();
        builder.build(&instruments, minutes, limit).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&matrix)?);
    } else {
        print_matrix(&matrix);
    }

    if let Some(path) = csv_path {
        let file = std::fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        matrix.write_csv(file)?;
        println!("Matrix written to: {}", path.display());
    }

    Ok(())
}

fn print_matrix(matrix: &CorrelationMatrix) {
    if matrix.is_empty() {
        println!("No instruments to correlate");
        return;
    }
    print!("{:<8}", "");
    for symbol in matrix.symbols() {
        print!("{symbol:>8}");
    }
    println!();
    for (symbol, row) in matrix.symbols().iter().zip(matrix.values()) {
        print!("{symbol:<8}");
        for value in row {
            print!("{value:>8.3}");
        }
        println!();
    }
}
