//! Gas top-ups from the relayer wallet

use std::sync::Arc;

use ethers::types::{Address, U256};
use tracing::{debug, error, info};

use crate::chain::{ChainClient, TransferRequest};
use crate::error::{Error, Result};
use crate::wallet::WalletCredential;

use super::types::{GasPlan, NATIVE_GAS_LIMIT};

/// Funds source wallets that cannot pay their own fees
pub struct GasRelay {
    client: Arc<dyn ChainClient>,
    relayer: Option<WalletCredential>,
}

impl GasRelay {
    pub fn new(client: Arc<dyn ChainClient>, relayer: Option<WalletCredential>) -> Self {
        Self { client, relayer }
    }

    /// Make sure `wallet` holds at least `required_native` wei
    ///
    /// Sends exactly the shortfall and waits for it to confirm. No-op when
    /// the balance already covers the requirement. Never retries.
    pub async fn ensure_gas(&self, wallet: Address, required_native: U256) -> Result<GasPlan> {
        let current = self.client.native_balance(wallet).await?;
        let plan = GasPlan::new(wallet, required_native, current);

        if plan.is_sufficient() {
            debug!(
                "Wallet {:?} already holds {} wei (needs {})",
                wallet, current, required_native
            );
            return Ok(plan);
        }

        let relayer = self.relayer.as_ref().ok_or_else(|| {
            error!("[ERROR] Relayer private key not provided. Cannot add gas.");
            Error::RelayerUnavailable(format!("{:?}", wallet))
        })?;

        let fee_rate = self.client.fee_rate().await?;
        let gas_limit = U256::from(NATIVE_GAS_LIMIT);
        let relay_fee = gas_limit.saturating_mul(fee_rate);
        let needed = plan.shortfall.saturating_add(relay_fee);

        let relayer_balance = self.client.native_balance(relayer.address()).await?;
        if relayer_balance < needed {
            error!(
                "[ERROR] Relayer wallet does not have enough native tokens. Required: {} wei, available: {} wei",
                needed, relayer_balance
            );
            return Err(Error::InsufficientRelayerFunds {
                available: relayer_balance.to_string(),
                required: needed.to_string(),
            });
        }

        info!(
            "Relayer ({:?}) is sending {} wei to wallet {:?}...",
            relayer.address(),
            plan.shortfall,
            wallet
        );

        let request = TransferRequest::native(wallet, plan.shortfall, gas_limit, fee_rate);
        let tx_hash = self.client.submit_transfer(relayer, request).await?;
        info!("Relay transaction sent! Hash: {:?}", tx_hash);

        let confirmation = self.client.wait_for_confirmation(tx_hash).await?;
        info!(
            outcome = "success",
            block = ?confirmation.block_number,
            "Relay transaction confirmed. Wallet {:?} now has enough gas.",
            wallet
        );

        Ok(plan)
    }
}
