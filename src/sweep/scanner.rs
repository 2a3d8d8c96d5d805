//! Asset discovery
//!
//! Walks every (wallet, contract) pair and keeps the nonzero balances.

use std::sync::Arc;
use std::time::Duration;

use ethers::types::Address;
use tracing::{debug, error, info};

use crate::chain::{ChainClient, ContractRead};
use crate::wallet::WalletCredential;

use super::types::{AssetClass, AssetTarget, DiscoveredAsset};

/// Sequential balance scanner
pub struct AssetScanner {
    client: Arc<dyn ChainClient>,
    /// Pause after every balance query
    delay: Duration,
}

impl AssetScanner {
    pub fn new(client: Arc<dyn ChainClient>, delay: Duration) -> Self {
        Self { client, delay }
    }

    /// Find every nonzero holding, wallet-major and contract-minor
    ///
    /// A failed query is logged and skipped. The native class has no
    /// contracts and always yields nothing.
    pub async fn scan(
        &self,
        wallets: &[WalletCredential],
        contracts: &[Address],
        asset_class: AssetClass,
    ) -> Vec<DiscoveredAsset> {
        let targets = AssetTarget::for_contracts(contracts, asset_class);
        let mut found = Vec::new();

        if targets.is_empty() {
            return found;
        }

        for wallet in wallets {
            let owner = wallet.address();
            info!("[Check] Checking wallet: {:?}", owner);

            for target in &targets {
                match self
                    .client
                    .read_contract(target.contract, ContractRead::BalanceOf { owner })
                    .await
                {
                    Ok(quantity) if !quantity.is_zero() => {
                        info!(
                            "[Check] Found {} with balance/count {} in wallet {:?}",
                            target.asset_class, quantity, owner
                        );
                        found.push(DiscoveredAsset {
                            wallet: wallet.clone(),
                            contract: target.contract,
                            asset_class: target.asset_class,
                            quantity,
                        });
                    }
                    Ok(_) => {
                        debug!("[Check] Nothing on {:?} for {:?}", target.contract, owner);
                    }
                    Err(e) => {
                        error!(
                            "[Check] Failed to check contract {:?} on wallet {:?}: {}",
                            target.contract, owner, e
                        );
                    }
                }

                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
            }
        }

        found
    }
}
