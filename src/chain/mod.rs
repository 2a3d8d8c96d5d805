//! Chain access
//!
//! The sweep engine only talks to the network through [`ChainClient`]:
//! - balance and fee-rate queries
//! - read-only contract calls
//! - transaction submission and confirmation waiting
//!
//! [`EvmClient`] is the JSON-RPC implementation used by the binary.

pub mod abi;
pub mod evm;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, TxHash, U256};

use crate::error::Result;
use crate::wallet::WalletCredential;

pub use evm::EvmClient;

/// Read-only contract calls the sweeper needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractRead {
    /// `balanceOf(owner)` - token units for ERC-20, item count for ERC-721
    BalanceOf { owner: Address },
    /// `tokenOfOwnerByIndex(owner, index)` - ERC-721 enumerable extension
    TokenOfOwnerByIndex { owner: Address, index: U256 },
}

/// A fully specified outgoing transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: U256,
    pub fee_rate: U256,
}

impl TransferRequest {
    /// Plain value transfer
    pub fn native(to: Address, value: U256, gas_limit: U256, fee_rate: U256) -> Self {
        Self {
            to,
            value,
            data: Bytes::default(),
            gas_limit,
            fee_rate,
        }
    }

    /// Zero-value contract call
    pub fn call(contract: Address, data: Bytes, gas_limit: U256, fee_rate: U256) -> Self {
        Self {
            to: contract,
            value: U256::zero(),
            data,
            gas_limit,
            fee_rate,
        }
    }

    /// Maximum fee this transaction can cost
    pub fn max_fee(&self) -> U256 {
        self.gas_limit.saturating_mul(self.fee_rate)
    }
}

/// A mined, successful transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Read/write access to one network
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Native currency balance in wei
    async fn native_balance(&self, address: Address) -> Result<U256>;

    /// Current fee rate (gas price) in wei per gas unit
    async fn fee_rate(&self) -> Result<U256>;

    /// Execute a read-only contract call returning a single uint256
    async fn read_contract(&self, contract: Address, call: ContractRead) -> Result<U256>;

    /// Sign and broadcast a transaction from `from`
    async fn submit_transfer(
        &self,
        from: &WalletCredential,
        request: TransferRequest,
    ) -> Result<TxHash>;

    /// Wait until the transaction is mined; reverted transactions are errors
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation>;
}
