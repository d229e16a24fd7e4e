mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use labdash_core::config::parse_env_bool;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

const LOG_FILTER_ENV: &str = "LABDASH_LOG";
const LOG_JSON_ENV: &str = "LABDASH_LOG_JSON";

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    commands::run_from_root(cli.root.as_deref(), cli.command)
}

// stdout carries command output, so logs always go to stderr.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = parse_env_bool(std::env::var(LOG_JSON_ENV).ok().as_deref());

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        eprintln!("tracing init skipped: {err}");
    }
}
