//! EVM Sweeper - moves wallet balances to one destination on a timer
//!
//! # WARNING
//! - Source and relayer keys are read from config.toml / environment.
//!   Keep those files private.
//! - Every round moves ALL available balance of the chosen asset class.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

// Use the library crate
use evm_sweeper::cli::commands;
use evm_sweeper::config::Config;
use evm_sweeper::sweep::AssetClass;

/// EVM Sweeper - periodic native/ERC-20/NFT sweeper
#[derive(Parser)]
#[command(name = "sweeper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "SWEEPER_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start sweeping (asks for missing choices)
    Sweep {
        /// Asset class: native, erc-20, nft
        #[arg(short, long)]
        asset: Option<AssetClass>,

        /// Network name from config
        #[arg(short, long)]
        network: Option<String>,

        /// Run a single round and print its report
        #[arg(long)]
        once: bool,
    },

    /// Show current configuration (secrets masked)
    Config,

    /// List configured networks
    Networks,

    /// Check RPC and wallet balances on a network
    Health {
        /// Network name from config
        network: String,
    },
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("evm_sweeper=info".parse()?);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.json_logs)?;

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Some(Commands::Sweep {
            asset,
            network,
            once,
        }) => commands::sweep(&config, asset, network, once).await,
        None => commands::sweep(&config, None, None, false).await,
        Some(Commands::Config) => commands::show_config(&config),
        Some(Commands::Networks) => commands::networks(&config),
        Some(Commands::Health { network }) => commands::health(&config, &network).await,
    };

    if let Err(e) = result {
        error!("The application encountered a fatal error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
