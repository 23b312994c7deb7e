//! Wallet Record Store
//!
//! The ordered list of wallet records, persisted as one JSON array. Each
//! record pairs public metadata with the password envelope holding its
//! recovery phrase. Names are unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Network;
use crate::envelope::Envelope;
use crate::error::WalletError;
use crate::storage::{Storage, StoreFile};

/// A persisted wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    /// User-chosen label, unique within the store
    pub name: String,

    /// Base58 public key derived from the sealed phrase
    pub address: String,

    /// Recovery phrase sealed under the wallet password
    pub encrypted_mnemonic: Envelope,

    pub created_at: DateTime<Utc>,

    pub network: Network,
}

/// The collection of wallet records behind a [`Storage`].
#[derive(Debug, Clone)]
pub struct WalletStore<S> {
    storage: S,
}

impl<S: Storage> WalletStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load all records; an empty list on first run.
    pub fn load(&self) -> Result<Vec<WalletRecord>, WalletError> {
        match self.storage.read(StoreFile::Wallets)? {
            None => Ok(Vec::new()),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| WalletError::Storage(format!("wallet store is corrupt: {}", e))),
        }
    }

    /// Replace the persisted records.
    pub fn save(&self, records: &[WalletRecord]) -> Result<(), WalletError> {
        let json = serde_json::to_vec_pretty(records)?;
        self.storage.write(StoreFile::Wallets, &json)
    }

    /// Append a record, rejecting an invalid name or one already in use.
    ///
    /// Nothing is written when the record is rejected.
    pub fn add(&self, record: WalletRecord) -> Result<(), WalletError> {
        validate_wallet_name(&record.name)?;
        let mut records = self.load()?;
        if find_record(&records, &record.name).is_some() {
            return Err(WalletError::DuplicateName(record.name));
        }
        records.push(record);
        self.save(&records)
    }

    /// Remove and return the record called `name`.
    pub fn remove(&self, name: &str) -> Result<WalletRecord, WalletError> {
        let mut records = self.load()?;
        let index = records
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| WalletError::NotFound(name.to_string()))?;
        let removed = records.remove(index);
        self.save(&records)?;
        Ok(removed)
    }

    pub fn find(&self, name: &str) -> Result<Option<WalletRecord>, WalletError> {
        Ok(find_record(&self.load()?, name).cloned())
    }
}

/// Check that `name` can label a wallet.
///
/// Blank names are rejected: the configuration treats an empty active name as
/// no active wallet, so such a wallet could never be selected.
pub fn validate_wallet_name(name: &str) -> Result<(), WalletError> {
    if name.trim().is_empty() {
        return Err(WalletError::InvalidName("name is empty".to_string()));
    }
    if name.chars().any(char::is_control) {
        return Err(WalletError::InvalidName(
            "name contains control characters".to_string(),
        ));
    }
    Ok(())
}

/// Look up a record by name
pub fn find_record<'a>(records: &'a [WalletRecord], name: &str) -> Option<&'a WalletRecord> {
    records.iter().find(|r| r.name == name)
}
