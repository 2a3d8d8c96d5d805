//! Transfer execution
//!
//! One operation per asset class. All of them share the same shape:
//! fixed gas limit, fresh fee rate, relay top-up when short, submit, then
//! wait for confirmation. Failures are logged and returned in the result,
//! never propagated.

use std::sync::Arc;
use std::time::Duration;

use ethers::types::{Address, U256};
use tracing::{error, info, warn};

use crate::chain::{abi, ChainClient, ContractRead, TransferRequest};
use crate::error::{Error, Result};
use crate::wallet::WalletCredential;

use super::relay::GasRelay;
use super::types::{AssetClass, GasPlan, TransferResult};

/// Executes sweeps for one destination
pub struct TransferExecutor {
    client: Arc<dyn ChainClient>,
    relay: GasRelay,
    /// Pause after every NFT item
    item_delay: Duration,
}

impl TransferExecutor {
    pub fn new(client: Arc<dyn ChainClient>, relay: GasRelay, item_delay: Duration) -> Self {
        Self {
            client,
            relay,
            item_delay,
        }
    }

    /// Send the whole native balance minus the fee
    ///
    /// Returns `None` when the balance does not exceed the fee.
    pub async fn transfer_native(
        &self,
        wallet: &WalletCredential,
        destination: Address,
    ) -> Option<TransferResult> {
        let address = wallet.address();
        info!("--- Processing native wallet: {:?} ---", address);

        let (balance, fee_rate) = match self.native_snapshot(address).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("[NATIVE] Failed to read wallet {:?}: {}", address, e);
                return Some(
                    TransferResult::new(address, AssetClass::Native, None, U256::zero())
                        .failed(&e),
                );
            }
        };

        let gas_limit = AssetClass::Native.gas_limit();
        let fee = gas_limit.saturating_mul(fee_rate);

        if balance <= fee {
            info!(
                "Insufficient native balance for gas. Balance: {} wei, fee: {} wei",
                balance, fee
            );
            return None;
        }

        let amount = balance - fee;
        info!("Sufficient balance. Sweeping {} wei native tokens...", amount);

        let request = TransferRequest::native(destination, amount, gas_limit, fee_rate);
        let result = TransferResult::new(address, AssetClass::Native, None, amount);
        Some(self.submit_and_confirm(wallet, request, result).await)
    }

    /// Send `quantity` units of an ERC-20 token
    pub async fn transfer_fungible(
        &self,
        wallet: &WalletCredential,
        destination: Address,
        contract: Address,
        quantity: U256,
    ) -> TransferResult {
        let class = AssetClass::Fungible;
        let result = TransferResult::new(wallet.address(), class, Some(contract), quantity);

        if quantity.is_zero() {
            warn!("[ERC-20] Nothing to sweep on {:?}", contract);
            return result.failed(&Error::Internal("zero quantity".to_string()));
        }

        let fee_rate = match self.fund(wallet, class).await {
            Ok(rate) => rate,
            Err(e) => return result.failed(&e),
        };

        info!(
            "[ERC-20] Sweeping balance of {} from {:?} on {:?}...",
            quantity,
            wallet.address(),
            contract
        );

        let request = TransferRequest::call(
            contract,
            abi::erc20_transfer(destination, quantity),
            class.gas_limit(),
            fee_rate,
        );
        self.submit_and_confirm(wallet, request, result).await
    }

    /// Send `count` NFTs, one at a time
    ///
    /// Each iteration asks for the item at owner index 0, because every
    /// completed transfer shifts the remaining enumeration.
    pub async fn transfer_non_fungible(
        &self,
        wallet: &WalletCredential,
        destination: Address,
        contract: Address,
        count: U256,
    ) -> Vec<TransferResult> {
        let count = if count > U256::from(u64::MAX) {
            u64::MAX
        } else {
            count.as_u64()
        };

        let mut results = Vec::new();
        for _ in 0..count {
            results.push(self.transfer_first_item(wallet, destination, contract).await);

            if !self.item_delay.is_zero() {
                tokio::time::sleep(self.item_delay).await;
            }
        }

        results
    }

    async fn transfer_first_item(
        &self,
        wallet: &WalletCredential,
        destination: Address,
        contract: Address,
    ) -> TransferResult {
        let class = AssetClass::NonFungible;
        let owner = wallet.address();
        let mut result = TransferResult::new(owner, class, Some(contract), U256::zero());

        let token_id = match self
            .client
            .read_contract(
                contract,
                ContractRead::TokenOfOwnerByIndex {
                    owner,
                    index: U256::zero(),
                },
            )
            .await
        {
            Ok(id) => id,
            Err(e) => {
                error!("[NFT] Failed to sweep NFT: {}", e);
                return result.failed(&e);
            }
        };
        result.amount = token_id;

        let fee_rate = match self.fund(wallet, class).await {
            Ok(rate) => rate,
            Err(e) => return result.failed(&e),
        };

        info!(
            "[NFT] Sweeping NFT with ID #{} from contract {:?}...",
            token_id, contract
        );

        let request = TransferRequest::call(
            contract,
            abi::erc721_safe_transfer_from(owner, destination, token_id),
            class.gas_limit(),
            fee_rate,
        );
        self.submit_and_confirm(wallet, request, result).await
    }

    async fn native_snapshot(&self, address: Address) -> Result<(U256, U256)> {
        let balance = self.client.native_balance(address).await?;
        let fee_rate = self.client.fee_rate().await?;
        Ok((balance, fee_rate))
    }

    /// Plan fees for one attempt and top up through the relay when short
    ///
    /// Returns the fee rate the transfer must be submitted with.
    async fn fund(&self, wallet: &WalletCredential, class: AssetClass) -> Result<U256> {
        let address = wallet.address();

        let fee_rate = self.client.fee_rate().await.map_err(|e| {
            error!("[{}] Failed to fetch fee rate: {}", class.tag(), e);
            e
        })?;
        let required = class.gas_limit().saturating_mul(fee_rate);
        let current = self.client.native_balance(address).await.map_err(|e| {
            error!("[{}] Failed to read balance of {:?}: {}", class.tag(), address, e);
            e
        })?;

        let plan = GasPlan::new(address, required, current);
        if plan.is_sufficient() {
            return Ok(fee_rate);
        }

        warn!(
            "[{}] Wallet {:?} does not have enough native tokens for gas (short {} wei). Attempting to use a relayer...",
            class.tag(),
            address,
            plan.shortfall
        );

        if let Err(e) = self.relay.ensure_gas(address, plan.required_native).await {
            error!(
                "[{}] Gas top-up for {:?} failed, skipping transfer: {}",
                class.tag(),
                address,
                e
            );
            return Err(Error::InsufficientFunds {
                available: plan.current_native.to_string(),
                required: plan.required_native.to_string(),
            });
        }

        Ok(fee_rate)
    }

    async fn submit_and_confirm(
        &self,
        wallet: &WalletCredential,
        request: TransferRequest,
        mut result: TransferResult,
    ) -> TransferResult {
        let tag = result.asset_class.tag();

        let tx_hash = match self.client.submit_transfer(wallet, request).await {
            Ok(hash) => hash,
            Err(e) => {
                error!("[{}] Failed to send from {:?}: {}", tag, wallet.address(), e);
                return result.failed(&e);
            }
        };
        info!("[{}] Transaction sent! Hash: {:?}", tag, tx_hash);
        result.tx_hash = Some(tx_hash);

        match self.client.wait_for_confirmation(tx_hash).await {
            Ok(confirmation) => {
                info!(
                    outcome = "success",
                    block = ?confirmation.block_number,
                    "[{}] Transaction {:?} successfully confirmed!",
                    tag,
                    tx_hash
                );
                result.confirmed = true;
                result
            }
            Err(e) => {
                error!("[{}] Transaction {:?} not confirmed: {}", tag, tx_hash, e);
                result.failed(&e)
            }
        }
    }
}
