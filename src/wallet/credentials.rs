//! Credential handling for source and relayer wallets
//!
//! Keys come from the validated configuration and live only in process
//! memory for the duration of the run. Nothing here writes them anywhere.

use std::fmt;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};

/// Signing material for one account
#[derive(Clone)]
pub struct WalletCredential {
    /// Display label: "wallet-1", "relayer"
    pub name: String,
    signer: LocalWallet,
}

impl WalletCredential {
    /// Parse a hex private key (with or without 0x prefix)
    pub fn from_key(name: impl Into<String>, key: &str) -> Result<Self> {
        let name = name.into();
        let signer = key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| Error::InvalidKey(format!("{}: {}", name, e)))?;

        Ok(Self { name, signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signer used by the chain client when submitting
    pub fn signer(&self) -> &LocalWallet {
        &self.signer
    }
}

impl fmt::Debug for WalletCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletCredential")
            .field("name", &self.name)
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// All credentials for one run
#[derive(Debug, Clone)]
pub struct CredentialSet {
    pub sources: Vec<WalletCredential>,
    pub relayer: Option<WalletCredential>,
}

impl CredentialSet {
    /// Build credentials from configuration
    ///
    /// A bad source key is fatal. A bad relayer key is logged and the run
    /// continues without a relayer.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.source_wallet_keys.is_empty() {
            return Err(Error::Config(
                "source_wallet_keys must contain at least one key".to_string(),
            ));
        }

        let sources = config
            .source_wallet_keys
            .iter()
            .enumerate()
            .map(|(i, key)| WalletCredential::from_key(format!("wallet-{}", i + 1), key))
            .collect::<Result<Vec<_>>>()?;

        for wallet in &sources {
            info!("Loaded source wallet {}: {:?}", wallet.name, wallet.address());
        }

        let relayer = match config.relayer_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => match WalletCredential::from_key("relayer", key) {
                Ok(relayer) => {
                    info!("Relayer wallet set up: {:?}", relayer.address());
                    Some(relayer)
                }
                Err(e) => {
                    error!("Invalid relayer private key, continuing without relayer: {}", e);
                    None
                }
            },
            _ => None,
        };

        Ok(Self { sources, relayer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // Well-known test keys (hardhat accounts 0 and 1)
    const KEY_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const KEY_1: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn config_with(sources: Vec<&str>, relayer: Option<&str>) -> Config {
        Config {
            networks: Default::default(),
            polling_interval_ms: 1_000,
            source_wallet_keys: sources.into_iter().map(String::from).collect(),
            relayer_key: relayer.map(String::from),
            destination_address: "0x000000000000000000000000000000000000dEaD".to_string(),
            contract_addresses: vec![],
            delays: Default::default(),
            rpc: Default::default(),
        }
    }

    #[test]
    fn test_key_parsing_with_and_without_prefix() {
        let w0 = WalletCredential::from_key("a", KEY_0).unwrap();
        let w1 = WalletCredential::from_key("b", KEY_1).unwrap();

        assert_eq!(
            w0.address(),
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
        assert_eq!(
            w1.address(),
            Address::from_str("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap()
        );
    }

    #[test]
    fn test_invalid_key_is_fatal() {
        let err = WalletCredential::from_key("bad", "0xnothex").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let w = WalletCredential::from_key("wallet-1", KEY_0).unwrap();
        let debug = format!("{:?}", w);
        assert!(!debug.contains(&KEY_0[2..]));
        assert!(debug.contains("wallet-1"));
    }

    #[test]
    fn test_credential_set_order_and_names() {
        let set = CredentialSet::from_config(&config_with(vec![KEY_0, KEY_1], None)).unwrap();
        assert_eq!(set.sources.len(), 2);
        assert_eq!(set.sources[0].name, "wallet-1");
        assert_eq!(set.sources[1].name, "wallet-2");
        assert!(set.relayer.is_none());
    }

    #[test]
    fn test_bad_relayer_key_is_dropped() {
        let set =
            CredentialSet::from_config(&config_with(vec![KEY_0], Some("garbage"))).unwrap();
        assert!(set.relayer.is_none());

        let set = CredentialSet::from_config(&config_with(vec![KEY_0], Some(KEY_1))).unwrap();
        assert_eq!(set.relayer.unwrap().name, "relayer");
    }

    #[test]
    fn test_bad_source_key_rejected() {
        assert!(CredentialSet::from_config(&config_with(vec![KEY_0, "zz"], None)).is_err());
        assert!(CredentialSet::from_config(&config_with(vec![], None)).is_err());
    }
}
