//! CLI command implementations

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::chain::{ChainClient, EvmClient};
use crate::cli::menu::{self, MenuChoice};
use crate::config::{mask_url, Config};
use crate::sweep::{start_sweep, AssetClass, Sweeper};
use crate::wallet::CredentialSet;

/// Sweep one asset class on one network
///
/// Missing choices are asked interactively. With `once`, a single round
/// runs and its report is printed as JSON.
pub async fn sweep(
    config: &Config,
    asset_class: Option<AssetClass>,
    network: Option<String>,
    once: bool,
) -> Result<()> {
    let (asset_class, network) =
        match menu::prompt(asset_class, network, &config.network_names())? {
            MenuChoice::Sweep {
                asset_class,
                network,
            } => (asset_class, network),
            MenuChoice::Exit => {
                info!("Thank you for using EVM Sweeper. Exiting...");
                return Ok(());
            }
        };

    if once {
        let mut sweeper = Sweeper::connect(config, &network).await?;
        let report = sweeper.run_round(asset_class).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    start_sweep(config, asset_class, &network).await?;
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// List configured networks
pub fn networks(config: &Config) -> Result<()> {
    for name in config.network_names() {
        let network = config.network(&name)?;
        println!("{:<16} {}", network.name, mask_url(&network.rpc_url));
    }
    Ok(())
}

/// Check provider reachability and wallet balances on one network
pub async fn health(config: &Config, network: &str) -> Result<()> {
    let network = config.network(network)?;
    let credentials = CredentialSet::from_config(config)?;

    println!("\n=== HEALTH: {} ===\n", network.name);

    print!("RPC... ");
    let client = match EvmClient::connect(&network.rpc_url, &config.rpc).await {
        Ok(client) => {
            println!("OK (chain id {})", client.chain_id());
            client
        }
        Err(e) => {
            println!("FAILED: {}", e);
            return Err(e).context("Provider unreachable");
        }
    };

    let fee_rate = client.fee_rate().await?;
    println!("Fee rate... {} wei/gas", fee_rate);

    for wallet in &credentials.sources {
        match client.native_balance(wallet.address()).await {
            Ok(balance) => println!(
                "{:<10} {:?}: {} wei",
                wallet.name,
                wallet.address(),
                balance
            ),
            Err(e) => println!("{:<10} {:?}: FAILED ({})", wallet.name, wallet.address(), e),
        }
    }

    match &credentials.relayer {
        Some(relayer) => {
            let balance = client.native_balance(relayer.address()).await?;
            let one_top_up = AssetClass::NonFungible.gas_limit().saturating_mul(fee_rate);
            println!("relayer    {:?}: {} wei", relayer.address(), balance);
            if balance < one_top_up {
                warn!(
                    "Relayer balance cannot cover a single NFT top-up ({} wei)",
                    one_top_up
                );
            }
        }
        None => println!("relayer    (not set)"),
    }

    println!();
    Ok(())
}
