//! Tessera CLI — identities, credentials and ledger utilities.
//!
//! Subcommands: init, demo, resolve, balance, faucet.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{CliConfig, LoggingConfig};

/// Tessera — self-sovereign identity on an alias-output ledger.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "tessera.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Run the issue, present, expire and revoke scenario end to end.
    Demo(commands::demo::DemoArgs),
    /// Resolve a DID to its document.
    Resolve(commands::resolve::ResolveArgs),
    /// Show the tokens available to an address.
    Balance(commands::balance::BalanceArgs),
    /// Request tokens from the faucet.
    Faucet(commands::faucet::FaucetArgs),
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Init(args) = &cli.command {
        return commands::init::run(args, &cli.config);
    }

    let config = CliConfig::load(&cli.config)?;
    init_tracing(&config.logging);

    match &cli.command {
        Commands::Init(_) => Ok(()),
        Commands::Demo(args) => commands::demo::run(args, &config).await,
        Commands::Resolve(args) => commands::resolve::run(args, &config).await,
        Commands::Balance(args) => commands::balance::run(args, &config).await,
        Commands::Faucet(args) => commands::faucet::run(args, &config).await,
    }
}
