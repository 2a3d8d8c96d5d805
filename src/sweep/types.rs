//! Core types for the sweep engine

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use ethers::types::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::wallet::WalletCredential;

/// Gas limit for a plain value transfer
pub const NATIVE_GAS_LIMIT: u64 = 21_000;

/// Gas limit for an ERC-20 `transfer`
pub const FUNGIBLE_GAS_LIMIT: u64 = 60_000;

/// Gas limit for an ERC-721 `safeTransferFrom`
pub const NON_FUNGIBLE_GAS_LIMIT: u64 = 200_000;

/// Asset class selected for a sweep run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    /// Chain's base currency
    Native,
    /// ERC-20 balances
    Fungible,
    /// ERC-721 items
    NonFungible,
}

impl AssetClass {
    pub const ALL: [AssetClass; 3] = [
        AssetClass::Native,
        AssetClass::Fungible,
        AssetClass::NonFungible,
    ];

    /// Fixed gas limit used instead of estimation
    pub fn gas_limit(&self) -> U256 {
        U256::from(match self {
            AssetClass::Native => NATIVE_GAS_LIMIT,
            AssetClass::Fungible => FUNGIBLE_GAS_LIMIT,
            AssetClass::NonFungible => NON_FUNGIBLE_GAS_LIMIT,
        })
    }

    /// Classes that live in contracts and need a discovery pass
    pub fn is_token(&self) -> bool {
        matches!(self, AssetClass::Fungible | AssetClass::NonFungible)
    }

    /// Short tag used in log lines
    pub fn tag(&self) -> &'static str {
        match self {
            AssetClass::Native => "NATIVE",
            AssetClass::Fungible => "ERC-20",
            AssetClass::NonFungible => "NFT",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Native => write!(f, "native"),
            AssetClass::Fungible => write!(f, "erc-20"),
            AssetClass::NonFungible => write!(f, "nft"),
        }
    }
}

impl FromStr for AssetClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(AssetClass::Native),
            "erc-20" | "erc20" | "fungible" | "token" => Ok(AssetClass::Fungible),
            "nft" | "erc-721" | "erc721" | "non-fungible" | "nonfungible" => {
                Ok(AssetClass::NonFungible)
            }
            other => Err(Error::Config(format!("Unknown asset class: {}", other))),
        }
    }
}

/// A contract to check, with the class it is swept as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssetTarget {
    pub contract: Address,
    pub asset_class: AssetClass,
}

impl AssetTarget {
    /// Targets for every contract; empty for the native class
    pub fn for_contracts(contracts: &[Address], asset_class: AssetClass) -> Vec<Self> {
        if !asset_class.is_token() {
            return Vec::new();
        }

        contracts
            .iter()
            .map(|&contract| Self {
                contract,
                asset_class,
            })
            .collect()
    }
}

/// A nonzero holding found during discovery
///
/// Lives for a single round.
#[derive(Debug, Clone)]
pub struct DiscoveredAsset {
    pub wallet: WalletCredential,
    pub contract: Address,
    pub asset_class: AssetClass,
    /// Raw token units, or item count for NFTs. Always > 0.
    pub quantity: U256,
}

/// Fee requirement for one transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPlan {
    pub wallet: Address,
    pub required_native: U256,
    pub current_native: U256,
    pub shortfall: U256,
}

impl GasPlan {
    pub fn new(wallet: Address, required_native: U256, current_native: U256) -> Self {
        Self {
            wallet,
            required_native,
            current_native,
            shortfall: required_native.saturating_sub(current_native),
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.shortfall.is_zero()
    }
}

/// Outcome of one transfer attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferResult {
    pub wallet: Address,
    pub asset_class: AssetClass,
    pub contract: Option<Address>,
    /// Wei for native, token units for ERC-20, token id for NFTs
    pub amount: U256,
    pub tx_hash: Option<TxHash>,
    pub confirmed: bool,
    /// Skipped because the wallet could not be funded for fees
    pub unfunded: bool,
    pub error: Option<String>,
}

impl TransferResult {
    pub fn new(
        wallet: Address,
        asset_class: AssetClass,
        contract: Option<Address>,
        amount: U256,
    ) -> Self {
        Self {
            wallet,
            asset_class,
            contract,
            amount,
            tx_hash: None,
            confirmed: false,
            unfunded: false,
            error: None,
        }
    }

    pub fn failed(mut self, error: &Error) -> Self {
        self.confirmed = false;
        self.unfunded = error.is_funding_failure();
        self.error = Some(error.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        self.confirmed && self.error.is_none()
    }
}

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SweepPhase {
    Idle,
    Scanning,
    Transferring,
}

impl fmt::Display for SweepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepPhase::Idle => write!(f, "idle"),
            SweepPhase::Scanning => write!(f, "scanning"),
            SweepPhase::Transferring => write!(f, "transferring"),
        }
    }
}

/// Summary of one round
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub asset_class: AssetClass,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Discovered assets (token classes) or wallets visited (native)
    pub discovered: usize,
    pub results: Vec<TransferResult>,
}

impl RoundReport {
    pub fn confirmed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.confirmed_count()
    }

    pub fn unfunded_count(&self) -> usize {
        self.results.iter().filter(|r| r.unfunded).count()
    }
}
