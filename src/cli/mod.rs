//! CLI module for the Ledger SQL Gateway
//!
//! - `serve`: HTTP API
//! - `retrain`: rebuild the retrieval index once and exit

pub mod retrain;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Ledger SQL Gateway - natural-language questions to read-only SQL
#[derive(Parser)]
#[command(name = "ledger-sql-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve,

    /// Rebuild the retrieval index from the live schema and worked examples
    Retrain,
}

/// Load `.env`, the layered configuration and the logger
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
