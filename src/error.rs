//! Error types for the sweeper

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sweeper
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Balance query failed: {0}")]
    NetworkQuery(String),

    // Funding errors
    #[error("Insufficient funds: {available} wei available, {required} wei required")]
    InsufficientFunds { available: String, required: String },

    #[error("Relayer not configured, cannot top up {0}")]
    RelayerUnavailable(String),

    #[error("Relayer has insufficient funds: {available} wei available, {required} wei required")]
    InsufficientRelayerFunds { available: String, required: String },

    // Transaction errors
    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Transaction confirmation failed: {0}")]
    Confirmation(String),

    #[error("Confirmation timeout after {0}ms")]
    ConfirmationTimeout(u64),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Errors that abort the process before any round starts
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::InvalidKey(_) | Error::InvalidAddress(_)
        )
    }

    /// Errors raised while funding a wallet for fees
    pub fn is_funding_failure(&self) -> bool {
        matches!(
            self,
            Error::InsufficientFunds { .. }
                | Error::RelayerUnavailable(_)
                | Error::InsufficientRelayerFunds { .. }
        )
    }
}

// Conversion from ethers provider errors
impl From<ethers::providers::ProviderError> for Error {
    fn from(e: ethers::providers::ProviderError) -> Self {
        Error::Rpc(e.to_string())
    }
}
