//! Configuration Record
//!
//! Tracks the active wallet and the network/RPC endpoint. Missing fields are
//! filled from defaults by a pure merge, so a first run needs no file.
//! The API key is held in memory only and is never serialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::storage::{Storage, StoreFile};

/// Environment variable overriding the RPC endpoint
pub const RPC_URL_ENV_VAR: &str = "TOKEN_WALLET_RPC_URL";

/// Environment variable supplying the in-memory API key
pub const API_KEY_ENV_VAR: &str = "TOKEN_WALLET_API_KEY";

/// Solana cluster a wallet is used on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Devnet,
    Testnet,
}

impl Network {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
        }
    }

    /// Public RPC endpoint for this cluster
    pub fn default_rpc_endpoint(self) -> &'static str {
        match self {
            Self::Mainnet => "https://api.mainnet-beta.solana.com",
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown network `{0}` (expected mainnet, devnet or testnet)
#[derive(Debug, displaydoc::Display, thiserror::Error, PartialEq, Eq)]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Self::Mainnet),
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

/// Wallet configuration
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Wallet used when a command names none
    pub active_wallet: Option<String>,

    pub network: Network,

    pub rpc_endpoint: String,

    /// Never persisted
    #[serde(skip)]
    pub api_key: Option<Zeroizing<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_network(Network::default())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("active_wallet", &self.active_wallet)
            .field("network", &self.network)
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Configuration as read from disk; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialConfig {
    pub active_wallet: Option<String>,
    pub network: Option<Network>,
    pub rpc_endpoint: Option<String>,
}

impl Config {
    /// Defaults for `network`, with its public endpoint and no active wallet
    pub fn for_network(network: Network) -> Self {
        Self {
            active_wallet: None,
            network,
            rpc_endpoint: network.default_rpc_endpoint().to_string(),
            api_key: None,
        }
    }

    /// Fill the gaps in `partial` from `defaults`.
    ///
    /// A stored network without a stored endpoint gets that network's public
    /// endpoint rather than the default network's.
    pub fn merge(defaults: Config, partial: PartialConfig) -> Config {
        let network = partial.network.unwrap_or(defaults.network);
        let rpc_endpoint = match partial.rpc_endpoint.filter(|e| !e.trim().is_empty()) {
            Some(endpoint) => endpoint,
            None if network == defaults.network => defaults.rpc_endpoint,
            None => network.default_rpc_endpoint().to_string(),
        };
        let active_wallet = partial
            .active_wallet
            .filter(|name| !name.is_empty())
            .or(defaults.active_wallet);

        Config {
            active_wallet,
            network,
            rpc_endpoint,
            api_key: defaults.api_key,
        }
    }

    /// Switch network, resetting the endpoint to the new network's default.
    pub fn set_network(&mut self, network: Network) {
        if self.network != network {
            self.network = network;
            self.rpc_endpoint = network.default_rpc_endpoint().to_string();
        }
    }

    /// Apply `TOKEN_WALLET_RPC_URL` and `TOKEN_WALLET_API_KEY`.
    ///
    /// The result is meant for use, not for saving: the endpoint override
    /// would otherwise be persisted.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(RPC_URL_ENV_VAR).ok(),
            std::env::var(API_KEY_ENV_VAR).ok(),
        )
    }

    fn with_overrides(mut self, rpc_url: Option<String>, api_key: Option<String>) -> Self {
        if let Some(url) = rpc_url.filter(|u| !u.trim().is_empty()) {
            self.rpc_endpoint = url;
        }
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = Some(Zeroizing::new(key));
        }
        self
    }
}

/// The configuration record behind a [`Storage`].
#[derive(Debug, Clone)]
pub struct ConfigStore<S> {
    storage: S,
}

impl<S: Storage> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the configuration, applying defaults for anything missing.
    pub fn load(&self) -> Result<Config, WalletError> {
        let partial = match self.storage.read(StoreFile::Config)? {
            None => PartialConfig::default(),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| WalletError::Storage(format!("config file is corrupt: {}", e)))?,
        };
        Ok(Config::merge(Config::default(), partial))
    }

    /// Persist every field except the API key.
    pub fn save(&self, config: &Config) -> Result<(), WalletError> {
        let json = serde_json::to_vec_pretty(config)?;
        self.storage.write(StoreFile::Config, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_defaults_without_file() {
        let store = ConfigStore::new(MemoryStorage::new());
        let config = store.load().unwrap();
        assert_eq!(config.active_wallet, None);
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.rpc_endpoint, "https://api.mainnet-beta.solana.com");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_merge_partial() {
        let partial: PartialConfig = serde_json::from_str(r#"{"activeWallet":"main"}"#).unwrap();
        let config = Config::merge(Config::default(), partial);
        assert_eq!(config.active_wallet.as_deref(), Some("main"));
        assert_eq!(config.network, Network::Mainnet);

        let partial: PartialConfig = serde_json::from_str(r#"{"network":"devnet"}"#).unwrap();
        let config = Config::merge(Config::default(), partial);
        assert_eq!(config.rpc_endpoint, "https://api.devnet.solana.com");

        let partial: PartialConfig = serde_json::from_str(
            r#"{"network":"devnet","rpcEndpoint":"https://rpc.example.org","extra":1}"#,
        )
        .unwrap();
        let config = Config::merge(Config::default(), partial);
        assert_eq!(config.network, Network::Devnet);
        assert_eq!(config.rpc_endpoint, "https://rpc.example.org");
    }

    #[test]
    fn test_empty_active_wallet_is_none() {
        let partial: PartialConfig =
            serde_json::from_str(r#"{"activeWallet":"","rpcEndpoint":""}"#).unwrap();
        let config = Config::merge(Config::default(), partial);
        assert_eq!(config.active_wallet, None);
        assert_eq!(config.rpc_endpoint, Network::Mainnet.default_rpc_endpoint());
    }

    #[test]
    fn test_api_key_never_persisted() {
        let storage = MemoryStorage::new();
        let store = ConfigStore::new(storage.clone());

        let mut config = Config::default();
        config.active_wallet = Some("main".to_string());
        config.api_key = Some(Zeroizing::new("x".to_string()));
        store.save(&config).unwrap();

        let raw = String::from_utf8(storage.raw(StoreFile::Config).unwrap()).unwrap();
        assert!(!raw.contains('x'), "raw config leaked the key: {}", raw);
        assert!(!raw.contains("apiKey"));

        let loaded = store.load().unwrap();
        assert_eq!(loaded.active_wallet.as_deref(), Some("main"));
        assert!(loaded.api_key.is_none());
    }

    #[test]
    fn test_persisted_shape() {
        let storage = MemoryStorage::new();
        let store = ConfigStore::new(storage.clone());
        store.save(&Config::for_network(Network::Testnet)).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&storage.raw(StoreFile::Config).unwrap()).unwrap();
        assert_eq!(value["activeWallet"], serde_json::Value::Null);
        assert_eq!(value["network"], "testnet");
        assert_eq!(value["rpcEndpoint"], "https://api.testnet.solana.com");
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_set_network_resets_endpoint() {
        let mut config = Config::default();
        config.rpc_endpoint = "https://custom.example.org".to_string();

        config.set_network(Network::Mainnet);
        assert_eq!(config.rpc_endpoint, "https://custom.example.org");

        config.set_network(Network::Devnet);
        assert_eq!(config.rpc_endpoint, Network::Devnet.default_rpc_endpoint());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(
            Some("https://private.example.org".to_string()),
            Some("key-123".to_string()),
        );
        assert_eq!(config.rpc_endpoint, "https://private.example.org");
        assert_eq!(config.api_key.as_deref().map(String::as_str), Some("key-123"));
        assert!(!format!("{:?}", config).contains("key-123"));

        let config = Config::default().with_overrides(Some(" ".to_string()), Some(String::new()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("mainnet-beta".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("DEVNET".parse::<Network>().unwrap(), Network::Devnet);
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert!("localnet".parse::<Network>().is_err());
        assert_eq!(Network::Devnet.to_string(), "devnet");
    }

    #[test]
    fn test_corrupt_config_is_storage_error() {
        let storage = MemoryStorage::new();
        storage.write(StoreFile::Config, b"[]").unwrap();
        assert!(matches!(
            ConfigStore::new(storage).load(),
            Err(WalletError::Storage(_))
        ));
    }
}
