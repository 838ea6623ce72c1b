//! RocketShoes CLI - Inspect and edit the local shopping cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart with totals
//! rocketshoes show
//!
//! # Add one unit of product 3
//! rocketshoes add 3
//!
//! # Set product 3 to a quantity of 2
//! rocketshoes update 3 2
//!
//! # Remove product 3
//! rocketshoes remove 3
//! ```
//!
//! # Commands
//!
//! - `show` - Print cart lines and totals
//! - `add` - Add a product (checks stock)
//! - `remove` - Remove a product
//! - `update` - Set a product's quantity (checks stock)
//!
//! Configuration comes from `ROCKETSHOES_*` environment variables (see
//! `rocketshoes_cart::config`). Exit status is 2 when the cart rejected the
//! requested change.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rocketshoes_cart::CartConfig;
use rocketshoes_core::ProductId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rocketshoes")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart with totals
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product ID
        product_id: ProductId,

        /// New quantity (absolute, not a delta)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = CartConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes=info,rocketshoes_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &config).await {
        Ok(commands::Outcome::Applied) => ExitCode::SUCCESS,
        Ok(commands::Outcome::Rejected) => ExitCode::from(2),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    cli: Cli,
    config: &CartConfig,
) -> Result<commands::Outcome, Box<dyn std::error::Error>> {
    let session = commands::CartSession::open(config)?;

    let outcome = match cli.command {
        Commands::Show => commands::Outcome::Applied,
        Commands::Add { product_id } => session.add(product_id).await,
        Commands::Remove { product_id } => session.remove(product_id),
        Commands::Update { product_id, amount } => session.update(product_id, amount).await,
    };

    session.show();
    Ok(outcome)
}
