//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ethers::types::Address;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Networks by name, e.g. `networks.sepolia.rpc_url`
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkEntry>,

    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,

    /// Private keys of the wallets to sweep (hex, optional 0x prefix)
    #[serde(default)]
    pub source_wallet_keys: Vec<String>,

    /// Optional key of the wallet that pays gas top-ups
    #[serde(default)]
    pub relayer_key: Option<String>,

    #[serde(default)]
    pub destination_address: String,

    /// ERC-20 or ERC-721 contracts to check on every wallet
    #[serde(default)]
    pub contract_addresses: Vec<String>,

    #[serde(default)]
    pub delays: DelayConfig,

    #[serde(default)]
    pub rpc: RpcConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkEntry {
    pub rpc_url: String,
}

/// Pauses between network operations, in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct DelayConfig {
    /// After every balance query during discovery
    #[serde(default = "default_scan_delay_ms")]
    pub scan_ms: u64,
    /// After every native wallet sweep
    #[serde(default = "default_native_delay_ms")]
    pub native_ms: u64,
    /// After every NFT item transfer
    #[serde(default = "default_nft_item_delay_ms")]
    pub nft_item_ms: u64,
    /// After every discovered asset
    #[serde(default = "default_asset_delay_ms")]
    pub asset_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            scan_ms: default_scan_delay_ms(),
            native_ms: default_native_delay_ms(),
            nft_item_ms: default_nft_item_delay_ms(),
            asset_ms: default_asset_delay_ms(),
        }
    }
}

impl DelayConfig {
    /// All delays disabled
    pub fn none() -> Self {
        Self {
            scan_ms: 0,
            native_ms: 0,
            nft_item_ms: 0,
            asset_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
            confirmations: default_confirmations(),
        }
    }
}

/// A single network selected for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: String,
    pub polling_interval: Duration,
}

fn default_polling_interval_ms() -> u64 {
    60_000
}

fn default_scan_delay_ms() -> u64 {
    500
}

fn default_native_delay_ms() -> u64 {
    1_000
}

fn default_nft_item_delay_ms() -> u64 {
    1_000
}

fn default_asset_delay_ms() -> u64 {
    2_000
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_confirmation_timeout_ms() -> u64 {
    180_000
}

fn default_confirmations() -> usize {
    1
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            .set_default("polling_interval_ms", default_polling_interval_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix SWEEPER__)
            .add_source(
                config::Environment::with_prefix("SWEEPER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("source_wallet_keys")
                    .with_list_parse_key("contract_addresses"),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.source_wallet_keys.is_empty() {
            anyhow::bail!("source_wallet_keys must contain at least one key");
        }

        if self.destination_address.trim().is_empty() {
            anyhow::bail!("destination_address is required");
        }

        Address::from_str(self.destination_address.trim()).with_context(|| {
            format!("Invalid destination_address: {}", self.destination_address)
        })?;

        for contract in &self.contract_addresses {
            Address::from_str(contract.trim())
                .with_context(|| format!("Invalid contract address: {}", contract))?;
        }

        if self.networks.is_empty() {
            anyhow::bail!("At least one network must be configured");
        }

        for (name, network) in &self.networks {
            if network.rpc_url.trim().is_empty() {
                anyhow::bail!("Network {} has an empty rpc_url", name);
            }
        }

        if self.polling_interval_ms == 0 {
            anyhow::bail!("polling_interval_ms must be positive");
        }

        if self.rpc.confirmations == 0 {
            anyhow::bail!("rpc.confirmations must be at least 1");
        }

        if self.contract_addresses.is_empty() {
            tracing::warn!("No contract_addresses configured - only native sweeps will find assets");
        }

        Ok(())
    }

    /// Resolve a network by name
    pub fn network(&self, name: &str) -> Result<NetworkConfig> {
        let entry = self.networks.get(name).with_context(|| {
            format!(
                "Unknown network '{}', configured: {:?}",
                name,
                self.network_names()
            )
        })?;

        Ok(NetworkConfig {
            name: name.to_string(),
            rpc_url: entry.rpc_url.clone(),
            polling_interval: Duration::from_millis(self.polling_interval_ms),
        })
    }

    /// Configured network names, sorted
    pub fn network_names(&self) -> Vec<String> {
        self.networks.keys().cloned().collect()
    }

    /// Parsed destination address
    pub fn destination(&self) -> Result<Address> {
        Address::from_str(self.destination_address.trim())
            .with_context(|| format!("Invalid destination_address: {}", self.destination_address))
    }

    /// Parsed contract addresses, in configured order
    pub fn contracts(&self) -> Result<Vec<Address>> {
        self.contract_addresses
            .iter()
            .map(|c| {
                Address::from_str(c.trim())
                    .with_context(|| format!("Invalid contract address: {}", c))
            })
            .collect()
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        let networks = self
            .networks
            .iter()
            .map(|(name, n)| format!("    {}: {}\n", name, mask_url(&n.rpc_url)))
            .collect::<String>();

        format!(
            r#"Configuration:
  Networks:
{}  Polling interval: {}ms
  Source wallets: {} key(s) ***
  Relayer: {}
  Destination: {}
  Contracts: {:?}
  Delays:
    scan: {}ms
    native: {}ms
    nft_item: {}ms
    asset: {}ms
  RPC:
    timeout: {}ms
    confirmation_timeout: {}ms
    confirmations: {}
"#,
            networks,
            self.polling_interval_ms,
            self.source_wallet_keys.len(),
            match &self.relayer_key {
                Some(k) if !k.trim().is_empty() => "***",
                _ => "(not set)",
            },
            self.destination_address,
            self.contract_addresses,
            self.delays.scan_ms,
            self.delays.native_ms,
            self.delays.nft_item_ms,
            self.delays.asset_ms,
            self.rpc.timeout_ms,
            self.rpc.confirmation_timeout_ms,
            self.rpc.confirmations,
        )
    }
}

/// Mask URL for display (hide API keys in query params and paths)
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        return format!("{}?***", &url[..idx]);
    }

    // Providers like Infura/Alchemy put the key in the last path segment
    match url.rfind('/') {
        Some(idx) if idx + 1 < url.len() && url[..idx].contains("/v") => {
            format!("{}/***", &url[..idx])
        }
        _ => url.to_string(),
    }
}
