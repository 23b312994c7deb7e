//! Error types for the wallet library.

use displaydoc::Display;
use thiserror::Error;

/// Errors surfaced by wallet operations.
///
/// Messages name the wallet or field at fault but never carry a password,
/// recovery phrase or key.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum WalletError {
    /// A wallet named `{0}` already exists
    DuplicateName(String),

    /// No wallet named `{0}`
    NotFound(String),

    /// Invalid wallet name: {0}
    InvalidName(String),

    /// Invalid recovery phrase: {0}
    InvalidPhrase(String),

    /// Authentication failed: wrong password or corrupted wallet data
    Authentication,

    /// Storage error: {0}
    Storage(String),
}

impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        WalletError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::Storage(format!("malformed data: {}", err))
    }
}
