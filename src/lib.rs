//! EVM Sweeper Library
//!
//! Periodically moves native, ERC-20 or ERC-721 balances from a set of
//! source wallets to one destination, topping up gas from a relayer.

pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod sweep;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
