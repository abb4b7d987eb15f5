//! Marketplace Bridge CLI - migrations, reports and fee estimates.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (bridge tables and the session table)
//! mb-cli migrate
//!
//! # Print the raw orders report created since a date
//! mb-cli report orders --since 2025-01-01
//!
//! # Estimate marketplace fees for a product
//! mb-cli fees --asin B00EXAMPLE --price 19.99 --currency MXN --fba
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `report orders` - Create, poll and download an orders report
//! - `fees` - Estimate fees for an ASIN at a price

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "mb-cli")]
#[command(author, version, about = "Marketplace Bridge CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Download Selling Partner API reports
    Report {
        #[command(subcommand)]
        kind: ReportKind,
    },
    /// Estimate marketplace fees for a product
    Fees {
        /// Product ASIN
        #[arg(long)]
        asin: String,

        /// Listing price
        #[arg(long)]
        price: Decimal,

        /// ISO 4217 currency code
        #[arg(long, default_value = "USD")]
        currency: String,

        /// Fulfilled by Amazon
        #[arg(long)]
        fba: bool,
    },
}

#[derive(Subcommand)]
enum ReportKind {
    /// All orders created since a date
    Orders {
        /// Start date (`YYYY-MM-DD`)
        #[arg(long)]
        since: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so report output can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Report { kind } => match kind {
            ReportKind::Orders { since } => commands::report::orders(&since).await?,
        },
        Commands::Fees {
            asin,
            price,
            currency,
            fba,
        } => commands::fees::estimate(&asin, price, &currency, fba).await?,
    }
    Ok(())
}
