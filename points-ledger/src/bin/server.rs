//! Ledger server binary
//!
//! Opens the ledger from configuration and runs until interrupted. The
//! chat-platform command layer consumes the ledger in-process through
//! the [`points_ledger::Ledger`] handle.

use points_ledger::{Config, Ledger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting points ledger server");

    // Environment overrides on top of defaults
    let config = Config::from_env()?;

    let ledger = Ledger::open(config).await?;
    tracing::info!("Ledger opened successfully");

    let stats = ledger.stats()?;
    tracing::info!(total_accounts = stats.total_accounts, "Ledger stats");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down ledger server");
    ledger.shutdown().await?;

    Ok(())
}
