//! JSON-RPC chain client backed by ethers

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionRequest, TxHash, U256, U64};
use tracing::{debug, info, warn};

use crate::config::RpcConfig;
use crate::error::{Error, Result};
use crate::wallet::WalletCredential;

use super::{abi, ChainClient, Confirmation, ContractRead, TransferRequest};

/// Chain client for one EVM network
pub struct EvmClient {
    provider: Provider<Http>,
    chain_id: u64,
    timeout: Duration,
    confirmation_timeout: Duration,
    confirmations: usize,
}

impl EvmClient {
    /// Connect to an RPC endpoint and fetch its chain id
    ///
    /// Failing here is a startup error: the endpoint is malformed or
    /// unreachable after a short retry window.
    pub async fn connect(rpc_url: &str, rpc: &RpcConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| Error::Config(format!("Invalid RPC URL {}: {}", rpc_url, e)))?
            .interval(Duration::from_millis(2_000));

        let timeout = Duration::from_millis(rpc.timeout_ms);

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(4),
            max_elapsed_time: Some(timeout),
            ..Default::default()
        };

        let chain_id = retry(backoff, || async {
            match tokio::time::timeout(timeout, provider.get_chainid()).await {
                Ok(Ok(id)) => Ok(id),
                Ok(Err(e)) => {
                    warn!("Chain id query failed, retrying: {}", e);
                    Err(backoff::Error::transient(Error::from(e)))
                }
                Err(_) => Err(backoff::Error::transient(Error::Rpc(format!(
                    "timeout after {}ms",
                    rpc.timeout_ms
                )))),
            }
        })
        .await
        .map_err(|e| Error::Config(format!("Provider {} unreachable: {}", rpc_url, e)))?;

        info!("Connected to chain id {}", chain_id);

        Ok(Self {
            provider,
            chain_id: chain_id.as_u64(),
            timeout,
            confirmation_timeout: Duration::from_millis(rpc.confirmation_timeout_ms),
            confirmations: rpc.confirmations,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Bound a single RPC round-trip by the configured timeout
    async fn timed<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, ethers::providers::ProviderError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| Error::Rpc(format!("{}: {}", what, e))),
            Err(_) => Err(Error::Rpc(format!(
                "{}: timeout after {}ms",
                what,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl ChainClient for EvmClient {
    async fn native_balance(&self, address: Address) -> Result<U256> {
        self.timed("get_balance", self.provider.get_balance(address, None))
            .await
    }

    async fn fee_rate(&self) -> Result<U256> {
        self.timed("get_gas_price", self.provider.get_gas_price())
            .await
    }

    async fn read_contract(&self, contract: Address, call: ContractRead) -> Result<U256> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(contract)
            .data(abi::encode_read(call))
            .into();

        let output = self
            .timed("eth_call", self.provider.call(&tx, None))
            .await
            .map_err(|e| Error::NetworkQuery(format!("{:?} on {:?}: {}", call, contract, e)))?;

        abi::decode_uint(&output).map_err(|e| match e {
            Error::NetworkQuery(msg) => {
                Error::NetworkQuery(format!("{:?} on {:?}: {}", call, contract, msg))
            }
            other => other,
        })
    }

    async fn submit_transfer(
        &self,
        from: &WalletCredential,
        request: TransferRequest,
    ) -> Result<TxHash> {
        let signer = from.signer().clone().with_chain_id(self.chain_id);
        let client = SignerMiddleware::new(self.provider.clone(), signer);

        let tx = TransactionRequest::new()
            .from(from.address())
            .to(request.to)
            .value(request.value)
            .data(request.data)
            .gas(request.gas_limit)
            .gas_price(request.fee_rate);

        debug!(
            "Submitting from {:?} to {:?}: value={} gas={} price={}",
            from.address(),
            request.to,
            request.value,
            request.gas_limit,
            request.fee_rate
        );

        let pending = tokio::time::timeout(self.timeout, client.send_transaction(tx, None))
            .await
            .map_err(|_| {
                Error::Submission(format!("timeout after {}ms", self.timeout.as_millis()))
            })?
            .map_err(|e| Error::Submission(e.to_string()))?;

        Ok(pending.tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation> {
        let pending =
            PendingTransaction::new(tx_hash, &self.provider).confirmations(self.confirmations);

        let receipt = tokio::time::timeout(self.confirmation_timeout, pending)
            .await
            .map_err(|_| Error::ConfirmationTimeout(self.confirmation_timeout.as_millis() as u64))?
            .map_err(|e| Error::Confirmation(e.to_string()))?
            .ok_or_else(|| {
                Error::Confirmation(format!("{:?} dropped from mempool", tx_hash))
            })?;

        check_status(tx_hash, receipt.status)?;

        Ok(Confirmation {
            tx_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
        })
    }
}

/// Only an explicit status 0 is a revert; pre-Byzantium receipts carry none
fn check_status(tx_hash: TxHash, status: Option<U64>) -> Result<()> {
    match status {
        Some(status) if status.is_zero() => {
            Err(Error::Confirmation(format!("{:?} reverted", tx_hash)))
        }
        Some(_) => Ok(()),
        None => {
            warn!(
                "Receipt for {:?} has no status field, treating as mined",
                tx_hash
            );
            Ok(())
        }
    }
}
