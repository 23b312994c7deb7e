//! Token Wallet
//!
//! A command-line wallet for a single SPL token on Solana. Keys are derived
//! locally from a BIP39 recovery phrase; the phrase is stored only inside a
//! password-sealed envelope in a per-user directory.
//!
//! ## Security Model
//!
//! - The recovery phrase is never written in plaintext
//! - Unlocking decrypts and re-derives on every use; nothing stays unlocked
//! - Wrong passwords and tampered data are indistinguishable to callers
//! - Store files are owner-only and replaced atomically

pub mod config;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod manager;
pub mod secmem;
pub mod storage;
pub mod store;

pub mod commands;

pub use config::{Config, Network};
pub use envelope::Envelope;
pub use error::WalletError;
pub use keys::{MnemonicStrength, WalletKeys};
pub use manager::{CreatedWallet, UnlockedWallet, WalletManager, WalletSummary};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::WalletRecord;
