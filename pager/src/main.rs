//! Pager - append inbound text messages to per-sender session documents.
//!
//! A sender claims an empty session by texting its six-character id; every
//! later message from that sender is appended to the session as a paragraph,
//! heading or ordered list. The webhook server receives messages from the
//! SMS provider; the CLI provisions and inspects sessions.

mod cli;
mod config;
mod db;
mod error;
mod ids;
mod models;
mod server;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{execute, Cli};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    execute(cli, config).await
}
