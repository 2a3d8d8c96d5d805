//! Sweep rounds and the polling loop

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ethers::types::Address;
use tracing::{debug, info, warn};

use crate::chain::{ChainClient, EvmClient};
use crate::config::{mask_url, Config, DelayConfig, NetworkConfig};
use crate::error::{Error, Result};
use crate::wallet::CredentialSet;

use super::executor::TransferExecutor;
use super::relay::GasRelay;
use super::scanner::AssetScanner;
use super::types::{AssetClass, RoundReport, SweepPhase, TransferResult};

/// Everything a sweeper needs besides the chain client and keys
#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub destination: Address,
    pub contracts: Vec<Address>,
    pub delays: DelayConfig,
    pub polling_interval: Duration,
}

impl SweepSettings {
    pub fn from_config(config: &Config, network: &NetworkConfig) -> Result<Self> {
        let destination = config
            .destination()
            .map_err(|e| Error::InvalidAddress(format!("{:#}", e)))?;
        let contracts = config
            .contracts()
            .map_err(|e| Error::InvalidAddress(format!("{:#}", e)))?;

        Ok(Self {
            destination,
            contracts,
            delays: config.delays.clone(),
            polling_interval: network.polling_interval,
        })
    }
}

/// Drives sweep rounds for one network
pub struct Sweeper {
    credentials: CredentialSet,
    settings: SweepSettings,
    scanner: AssetScanner,
    executor: TransferExecutor,
    phase: SweepPhase,
}

impl Sweeper {
    pub fn new(
        client: Arc<dyn ChainClient>,
        credentials: CredentialSet,
        settings: SweepSettings,
    ) -> Self {
        let scanner = AssetScanner::new(
            client.clone(),
            Duration::from_millis(settings.delays.scan_ms),
        );
        let relay = GasRelay::new(client.clone(), credentials.relayer.clone());
        let executor = TransferExecutor::new(
            client,
            relay,
            Duration::from_millis(settings.delays.nft_item_ms),
        );

        Self {
            credentials,
            settings,
            scanner,
            executor,
            phase: SweepPhase::Idle,
        }
    }

    /// Build a sweeper for a configured network
    ///
    /// Every failure here is fatal: bad keys, bad addresses, unknown
    /// network, or an unreachable provider.
    pub async fn connect(config: &Config, network_name: &str) -> Result<Self> {
        let network = config
            .network(network_name)
            .map_err(|e| Error::Config(format!("{:#}", e)))?;
        let settings = SweepSettings::from_config(config, &network)?;
        let credentials = CredentialSet::from_config(config)?;

        info!(
            "Connecting to {} ({})...",
            network.name,
            mask_url(&network.rpc_url)
        );
        let client = EvmClient::connect(&network.rpc_url, &config.rpc).await?;

        Ok(Self::new(Arc::new(client), credentials, settings))
    }

    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    pub fn polling_interval(&self) -> Duration {
        self.settings.polling_interval
    }

    fn set_phase(&mut self, phase: SweepPhase) {
        debug!("Sweep phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Run one complete round
    ///
    /// Always completes; individual failures are inside the report.
    pub async fn run_round(&mut self, asset_class: AssetClass) -> RoundReport {
        let started_at = Utc::now();

        let (discovered, results) = match asset_class {
            AssetClass::Native => self.native_round().await,
            AssetClass::Fungible | AssetClass::NonFungible => {
                self.token_round(asset_class).await
            }
        };

        self.set_phase(SweepPhase::Idle);

        let report = RoundReport {
            asset_class,
            started_at,
            finished_at: Utc::now(),
            discovered,
            results,
        };

        info!(
            confirmed = report.confirmed_count(),
            failed = report.failed_count(),
            unfunded = report.unfunded_count(),
            "Sweep process finished for this round."
        );

        report
    }

    async fn native_round(&mut self) -> (usize, Vec<TransferResult>) {
        self.set_phase(SweepPhase::Transferring);

        let delay = Duration::from_millis(self.settings.delays.native_ms);
        let mut results = Vec::new();

        for wallet in &self.credentials.sources {
            if let Some(result) = self
                .executor
                .transfer_native(wallet, self.settings.destination)
                .await
            {
                results.push(result);
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        (self.credentials.sources.len(), results)
    }

    async fn token_round(&mut self, asset_class: AssetClass) -> (usize, Vec<TransferResult>) {
        self.set_phase(SweepPhase::Scanning);
        info!("--- Starting {} balance check on all wallets... ---", asset_class);

        // Discovery finishes completely before any transfer starts
        let assets = self
            .scanner
            .scan(
                &self.credentials.sources,
                &self.settings.contracts,
                asset_class,
            )
            .await;

        if assets.is_empty() {
            info!("No {} assets found. Stopping process.", asset_class);
            return (0, Vec::new());
        }

        info!(
            "--- Balance check complete ({} found). Starting sweep process... ---",
            assets.len()
        );
        self.set_phase(SweepPhase::Transferring);

        let delay = Duration::from_millis(self.settings.delays.asset_ms);
        let destination = self.settings.destination;
        let mut results = Vec::new();

        for asset in &assets {
            info!(
                "--- Processing {} asset in wallet {:?} ---",
                asset.asset_class.tag(),
                asset.wallet.address()
            );

            match asset.asset_class {
                AssetClass::Fungible => {
                    let result = self
                        .executor
                        .transfer_fungible(
                            &asset.wallet,
                            destination,
                            asset.contract,
                            asset.quantity,
                        )
                        .await;
                    results.push(result);
                }
                AssetClass::NonFungible => {
                    let items = self
                        .executor
                        .transfer_non_fungible(
                            &asset.wallet,
                            destination,
                            asset.contract,
                            asset.quantity,
                        )
                        .await;
                    results.extend(items);
                }
                AssetClass::Native => {
                    warn!("Native asset in discovery output, skipping");
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        (assets.len(), results)
    }

    /// Run rounds forever, re-arming the timer after each one
    pub async fn run(&mut self, asset_class: AssetClass) {
        loop {
            self.run_round(asset_class).await;
            tokio::time::sleep(self.settings.polling_interval).await;
            info!("--- Starting next sweep round ---");
        }
    }
}

/// Entry point: sweep `asset_class` on `network_name` until Ctrl-C
pub async fn start_sweep(
    config: &Config,
    asset_class: AssetClass,
    network_name: &str,
) -> Result<()> {
    let mut sweeper = Sweeper::connect(config, network_name).await?;

    info!(
        "Starting sweeper for asset type: {} on network: {}. Checking every {} seconds...",
        asset_class,
        network_name,
        sweeper.polling_interval().as_secs_f64()
    );

    tokio::select! {
        _ = sweeper.run(asset_class) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}
