//! Wallet credentials
//!
//! Source wallets are swept; the optional relayer only pays gas top-ups.

pub mod credentials;

pub use credentials::{CredentialSet, WalletCredential};
