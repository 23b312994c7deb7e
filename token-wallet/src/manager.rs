//! Wallet Session Facade
//!
//! Composes key derivation, the password envelope, the wallet store and the
//! configuration record into the operations callers use: create, import,
//! unlock, delete, list and active-wallet selection.
//!
//! There is no persisted unlocked state. Each unlock decrypts and re-derives;
//! dropping the [`UnlockedWallet`] scrubs its secrets.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigStore, Network};
use crate::envelope::{Envelope, DEFAULT_KDF_ITERATIONS};
use crate::error::WalletError;
use crate::keys::{MnemonicStrength, WalletKeys, SIGNATURE_LENGTH};
use crate::secmem::SecretString;
use crate::storage::Storage;
use crate::store::{validate_wallet_name, WalletRecord, WalletStore};

/// Public view of a wallet, free of secrets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSummary {
    pub name: String,
    pub address: String,
    pub network: Network,
}

impl From<&WalletRecord> for WalletSummary {
    fn from(record: &WalletRecord) -> Self {
        Self {
            name: record.name.clone(),
            address: record.address.clone(),
            network: record.network,
        }
    }
}

/// Result of creating a wallet.
///
/// This is the only time the generated recovery phrase leaves the library.
#[derive(Debug)]
pub struct CreatedWallet {
    pub record: WalletRecord,
    pub mnemonic: SecretString,
}

/// A decrypted wallet, held in memory only.
pub struct UnlockedWallet {
    record: WalletRecord,
    keys: WalletKeys,
}

impl UnlockedWallet {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn address(&self) -> &str {
        &self.record.address
    }

    pub fn network(&self) -> Network {
        self.record.network
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at
    }

    pub fn keys(&self) -> &WalletKeys {
        &self.keys
    }

    pub fn mnemonic_phrase(&self) -> &str {
        self.keys.mnemonic_phrase()
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.keys.sign(message)
    }

    /// Drop the decrypted secrets now.
    pub fn lock(self) {
        debug!(wallet = %self.record.name, "locking wallet");
        drop(self)
    }
}

impl fmt::Debug for UnlockedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockedWallet")
            .field("name", &self.record.name)
            .field("address", &self.record.address)
            .field("network", &self.record.network)
            .finish_non_exhaustive()
    }
}

/// Wallet operations over a [`Storage`].
///
/// Operations that modify the store or configuration run under an internal
/// mutex, so one manager may be shared between threads. Separate processes
/// sharing a directory are not coordinated: the last writer wins.
pub struct WalletManager<S> {
    wallets: WalletStore<S>,
    config: ConfigStore<S>,
    kdf_iterations: u32,
    strength: MnemonicStrength,
    write_lock: Mutex<()>,
}

impl<S: Storage + Clone> WalletManager<S> {
    pub fn new(storage: S) -> Self {
        Self {
            wallets: WalletStore::new(storage.clone()),
            config: ConfigStore::new(storage),
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            strength: MnemonicStrength::default(),
            write_lock: Mutex::new(()),
        }
    }
}

impl<S: Storage> WalletManager<S> {
    /// PBKDF2 cost for envelopes sealed by this manager
    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations;
        self
    }

    /// Phrase length for wallets created by this manager
    pub fn with_mnemonic_strength(mut self, strength: MnemonicStrength) -> Self {
        self.strength = strength;
        self
    }

    /// Generate a new wallet and make it active.
    pub fn create_wallet(
        &self,
        name: &str,
        password: &str,
        network: Network,
    ) -> Result<CreatedWallet, WalletError> {
        validate_wallet_name(name)?;
        let _guard = self.lock();

        // Fail before spending time on key derivation
        if self.wallets.find(name)?.is_some() {
            return Err(WalletError::DuplicateName(name.to_string()));
        }

        let keys = WalletKeys::generate(self.strength);
        let record = self.persist_new(name, &keys, password, network)?;
        info!(wallet = %name, address = %record.address, %network, "created wallet");

        Ok(CreatedWallet {
            record,
            mnemonic: SecretString::new(keys.mnemonic_phrase()),
        })
    }

    /// Import a wallet from its recovery phrase and make it active.
    ///
    /// The phrase is validated before anything is encrypted or written.
    pub fn import_wallet(
        &self,
        name: &str,
        phrase: &str,
        password: &str,
        network: Network,
    ) -> Result<WalletRecord, WalletError> {
        validate_wallet_name(name)?;
        let keys = WalletKeys::from_mnemonic(phrase)?;

        let _guard = self.lock();
        if self.wallets.find(name)?.is_some() {
            return Err(WalletError::DuplicateName(name.to_string()));
        }

        let record = self.persist_new(name, &keys, password, network)?;
        info!(wallet = %name, address = %record.address, %network, "imported wallet");
        Ok(record)
    }

    /// Seal, store and activate a new wallet. Caller holds the write lock.
    ///
    /// If the configuration cannot be updated the store is restored, so a
    /// failed create leaves no record behind.
    fn persist_new(
        &self,
        name: &str,
        keys: &WalletKeys,
        password: &str,
        network: Network,
    ) -> Result<WalletRecord, WalletError> {
        let encrypted_mnemonic =
            Envelope::seal_with_iterations(keys.mnemonic_phrase(), password, self.kdf_iterations)?;

        let record = WalletRecord {
            name: name.to_string(),
            address: keys.address(),
            encrypted_mnemonic,
            created_at: Utc::now(),
            network,
        };
        let previous = self.wallets.load()?;
        self.wallets.add(record.clone())?;

        let activate = || -> Result<(), WalletError> {
            let mut config = self.config.load()?;
            config.active_wallet = Some(name.to_string());
            config.set_network(network);
            self.config.save(&config)
        };
        if let Err(err) = activate() {
            return Err(self.restore_wallets(&previous, err));
        }

        Ok(record)
    }

    /// Put back the records saved before a failed operation, returning the
    /// operation's error.
    fn restore_wallets(&self, previous: &[WalletRecord], err: WalletError) -> WalletError {
        match self.wallets.save(previous) {
            Ok(()) => warn!("configuration update failed, wallet store restored: {}", err),
            Err(rollback) => warn!(
                "configuration update failed ({}) and the wallet store could not be restored: {}",
                err, rollback
            ),
        }
        err
    }

    /// Decrypt a wallet and re-derive its keys. Writes nothing.
    pub fn unlock(&self, name: &str, password: &str) -> Result<UnlockedWallet, WalletError> {
        let record = self
            .wallets
            .find(name)?
            .ok_or_else(|| WalletError::NotFound(name.to_string()))?;

        let phrase = record.encrypted_mnemonic.open(password)?;
        let keys = WalletKeys::from_mnemonic(phrase.as_str()).map_err(|_| {
            warn!(wallet = %name, "decrypted phrase failed validation");
            WalletError::Authentication
        })?;
        phrase.wipe();

        if keys.address() != record.address {
            warn!(wallet = %name, "derived address does not match the stored record");
            return Err(WalletError::Authentication);
        }

        debug!(wallet = %name, "unlocked wallet");
        Ok(UnlockedWallet { record, keys })
    }

    /// Delete a wallet.
    ///
    /// If it was active, the first remaining wallet becomes active, or none
    /// if the store is now empty. If that reassignment cannot be saved the
    /// wallet is restored.
    pub fn delete_wallet(&self, name: &str) -> Result<(), WalletError> {
        let _guard = self.lock();

        let previous = self.wallets.load()?;
        self.wallets.remove(name)?;

        let reassign = || -> Result<Option<Option<String>>, WalletError> {
            let mut config = self.config.load()?;
            if config.active_wallet.as_deref() != Some(name) {
                return Ok(None);
            }
            config.active_wallet = self.wallets.load()?.first().map(|r| r.name.clone());
            self.config.save(&config)?;
            Ok(Some(config.active_wallet))
        };

        match reassign() {
            Ok(reassigned) => {
                info!(wallet = %name, "deleted wallet");
                if let Some(active) = reassigned {
                    info!(?active, "reassigned active wallet");
                }
                Ok(())
            }
            Err(err) => Err(self.restore_wallets(&previous, err)),
        }
    }

    /// Make an existing wallet the active one.
    pub fn set_active_wallet(&self, name: &str) -> Result<(), WalletError> {
        let _guard = self.lock();

        if self.wallets.find(name)?.is_none() {
            return Err(WalletError::NotFound(name.to_string()));
        }

        let mut config = self.config.load()?;
        config.active_wallet = Some(name.to_string());
        self.config.save(&config)?;
        info!(wallet = %name, "set active wallet");
        Ok(())
    }

    /// All wallets in store order
    pub fn list_wallets(&self) -> Result<Vec<WalletSummary>, WalletError> {
        Ok(self.wallets.load()?.iter().map(WalletSummary::from).collect())
    }

    pub fn find_wallet(&self, name: &str) -> Result<Option<WalletRecord>, WalletError> {
        self.wallets.find(name)
    }

    /// The active wallet's record.
    ///
    /// A configured name with no matching record reads as no active wallet.
    pub fn get_active_wallet(&self) -> Result<Option<WalletRecord>, WalletError> {
        let Some(name) = self.config.load()?.active_wallet else {
            return Ok(None);
        };

        let record = self.wallets.find(&name)?;
        if record.is_none() {
            warn!(wallet = %name, "configured active wallet is missing from the store");
        }
        Ok(record)
    }

    pub fn load_config(&self) -> Result<Config, WalletError> {
        self.config.load()
    }

    pub fn save_config(&self, config: &Config) -> Result<(), WalletError> {
        let _guard = self.lock();
        self.config.save(config)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a panic elsewhere leaves nothing torn
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
