//! Sweep engine
//!
//! # Architecture
//!
//! ```text
//! Sweeper ──► AssetScanner            (discovery, token classes only)
//!    │
//!    └──────► TransferExecutor ──► GasRelay   (fee top-ups)
//!                   │                  │
//!                   └──── ChainClient ─┘
//! ```
//!
//! Everything runs on one task. Each wallet has at most one transaction in
//! flight, and a relay top-up is confirmed before the dependent transfer is
//! submitted.

pub mod executor;
pub mod relay;
pub mod scanner;
pub mod scheduler;
pub mod types;

pub use executor::TransferExecutor;
pub use relay::GasRelay;
pub use scanner::AssetScanner;
pub use scheduler::{start_sweep, SweepSettings, Sweeper};
pub use types::{
    AssetClass, AssetTarget, DiscoveredAsset, GasPlan, RoundReport, SweepPhase, TransferResult,
};
