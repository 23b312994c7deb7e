//! Integration tests for token-wallet
//!
//! These tests drive the public API end to end:
//! - Wallet lifecycle (create, unlock, import, delete)
//! - Active wallet bookkeeping
//! - On-disk format and file hygiene
//! - Signing with unlocked keys

use assert_matches::assert_matches;
use tempfile::TempDir;
use token_wallet::{
    envelope::MIN_KDF_ITERATIONS,
    keys::{parse_address, verify, WalletKeys},
    storage::StoreFile,
    Config, FileStorage, MemoryStorage, MnemonicStrength, Network, Storage, WalletError,
    WalletManager,
};

// Standard BIP39 test vector (12 words)
const TEST_MNEMONIC_12: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const TEST_PASSWORD: &str = "secure-test-password-123!";

fn memory_manager() -> (MemoryStorage, WalletManager<MemoryStorage>) {
    let storage = MemoryStorage::new();
    let manager = WalletManager::new(storage.clone()).with_kdf_iterations(MIN_KDF_ITERATIONS);
    (storage, manager)
}

fn file_manager(temp_dir: &TempDir) -> WalletManager<FileStorage> {
    WalletManager::new(FileStorage::new(temp_dir.path().join("wallet-home")))
        .with_kdf_iterations(MIN_KDF_ITERATIONS)
}

// ============================================================================
// Wallet Lifecycle Tests
// ============================================================================

mod wallet_lifecycle {
    use super::*;

    #[test]
    fn test_create_lists_and_activates() {
        // Default KDF cost, as a real user gets it
        let manager = WalletManager::new(MemoryStorage::new());

        let created = manager
            .create_wallet("main", "password123", Network::Mainnet)
            .unwrap();
        assert_eq!(created.mnemonic.as_str().split(' ').count(), 24);
        assert!(parse_address(&created.record.address).is_some());

        let wallets = manager.list_wallets().unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].name, "main");
        assert_eq!(manager.get_active_wallet().unwrap().unwrap().name, "main");
    }

    #[test]
    fn test_unlock_requires_correct_password() {
        let (_, manager) = memory_manager();
        let created = manager
            .create_wallet("main", "correct-pw", Network::Mainnet)
            .unwrap();

        assert_matches!(
            manager.unlock("main", "wrong-pw"),
            Err(WalletError::Authentication)
        );

        let unlocked = manager.unlock("main", "correct-pw").unwrap();
        assert_eq!(unlocked.address(), created.record.address);
        assert_eq!(unlocked.mnemonic_phrase(), created.mnemonic.as_str());
    }

    #[test]
    fn test_import_then_duplicate_import() {
        let (_, manager) = memory_manager();

        let record = manager
            .import_wallet("imp", TEST_MNEMONIC_12, "pw12345678", Network::Devnet)
            .unwrap();
        assert_eq!(record.network, Network::Devnet);
        assert_eq!(
            record.address,
            WalletKeys::from_mnemonic(TEST_MNEMONIC_12).unwrap().address()
        );

        assert_matches!(
            manager.import_wallet("imp", TEST_MNEMONIC_12, "pw12345678", Network::Devnet),
            Err(WalletError::DuplicateName(name)) if name == "imp"
        );
        assert_eq!(manager.list_wallets().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_missing_keeps_active() {
        let (_, manager) = memory_manager();
        manager.create_wallet("a", TEST_PASSWORD, Network::Mainnet).unwrap();
        manager.create_wallet("b", TEST_PASSWORD, Network::Mainnet).unwrap();
        manager.set_active_wallet("b").unwrap();

        assert_matches!(
            manager.delete_wallet("c"),
            Err(WalletError::NotFound(name)) if name == "c"
        );
        assert_eq!(manager.get_active_wallet().unwrap().unwrap().name, "b");
        assert_eq!(manager.list_wallets().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_active_reassigns() {
        let (_, manager) = memory_manager();
        manager.create_wallet("a", TEST_PASSWORD, Network::Mainnet).unwrap();
        manager.create_wallet("b", TEST_PASSWORD, Network::Mainnet).unwrap();
        manager.create_wallet("c", TEST_PASSWORD, Network::Mainnet).unwrap();
        manager.set_active_wallet("b").unwrap();

        manager.delete_wallet("b").unwrap();
        assert_eq!(manager.get_active_wallet().unwrap().unwrap().name, "a");

        manager.delete_wallet("a").unwrap();
        manager.delete_wallet("c").unwrap();
        assert_eq!(manager.get_active_wallet().unwrap(), None);
        assert!(manager.list_wallets().unwrap().is_empty());
    }

    #[test]
    fn test_import_restores_created_wallet() {
        let (_, manager) = memory_manager();
        let created = manager
            .create_wallet("original", TEST_PASSWORD, Network::Mainnet)
            .unwrap();
        manager.delete_wallet("original").unwrap();

        // Sloppy spacing and case still restore the same keys
        let typed = format!("  {}  ", created.mnemonic.as_str().to_uppercase());
        let record = manager
            .import_wallet("restored", &typed, "another-password", Network::Mainnet)
            .unwrap();
        assert_eq!(record.address, created.record.address);

        let unlocked = manager.unlock("restored", "another-password").unwrap();
        assert_eq!(unlocked.mnemonic_phrase(), created.mnemonic.as_str());
    }

    #[test]
    fn test_twelve_word_manager() {
        let manager = WalletManager::new(MemoryStorage::new())
            .with_kdf_iterations(MIN_KDF_ITERATIONS)
            .with_mnemonic_strength(MnemonicStrength::Words12);
        let created = manager
            .create_wallet("short", TEST_PASSWORD, Network::Testnet)
            .unwrap();
        assert_eq!(created.mnemonic.as_str().split(' ').count(), 12);
    }
}

// ============================================================================
// File Storage Tests
// ============================================================================

mod file_storage {
    use super::*;
    use std::fs;

    #[test]
    fn test_state_survives_new_manager() {
        let temp_dir = TempDir::new().unwrap();

        let created = file_manager(&temp_dir)
            .create_wallet("main", TEST_PASSWORD, Network::Devnet)
            .unwrap();

        let reopened = file_manager(&temp_dir);
        let active = reopened.get_active_wallet().unwrap().unwrap();
        assert_eq!(active.name, "main");
        assert_eq!(reopened.load_config().unwrap().network, Network::Devnet);

        let unlocked = reopened.unlock("main", TEST_PASSWORD).unwrap();
        assert_eq!(unlocked.address(), created.record.address);
    }

    #[test]
    fn test_raw_files_hold_no_secrets() {
        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);
        let created = manager
            .create_wallet("main", TEST_PASSWORD, Network::Mainnet)
            .unwrap();

        let dir = temp_dir.path().join("wallet-home");
        let wallets = fs::read_to_string(dir.join("wallets.json")).unwrap();
        let config = fs::read_to_string(dir.join("config.json")).unwrap();

        assert!(!wallets.contains(created.mnemonic.as_str()));
        assert!(!wallets.contains(TEST_PASSWORD));
        assert!(wallets.contains(&created.record.address));

        let value: serde_json::Value = serde_json::from_str(&wallets).unwrap();
        let envelope = &value[0]["encryptedMnemonic"];
        assert_eq!(envelope["salt"].as_str().unwrap().len(), 64);
        assert_eq!(envelope["iv"].as_str().unwrap().len(), 32);
        assert_eq!(envelope["authTag"].as_str().unwrap().len(), 32);
        assert_eq!(envelope["iterations"], MIN_KDF_ITERATIONS);

        let value: serde_json::Value = serde_json::from_str(&config).unwrap();
        assert_eq!(value["activeWallet"], "main");
        assert!(value.get("apiKey").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);
        manager.create_wallet("main", TEST_PASSWORD, Network::Mainnet).unwrap();

        let dir = temp_dir.path().join("wallet-home");
        for name in ["wallets.json", "config.json"] {
            let mode = fs::metadata(dir.join(name)).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{} has mode {:o}", name, mode);
        }
    }

    #[test]
    fn test_tampered_store_fails_authentication() {
        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);
        manager.create_wallet("main", TEST_PASSWORD, Network::Mainnet).unwrap();

        let path = temp_dir.path().join("wallet-home").join("wallets.json");
        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let encrypted = value[0]["encryptedMnemonic"]["encrypted"]
            .as_str()
            .unwrap()
            .to_string();
        let flipped = if encrypted.starts_with('0') { "1" } else { "0" };
        value[0]["encryptedMnemonic"]["encrypted"] =
            serde_json::Value::String(format!("{}{}", flipped, &encrypted[1..]));
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert_matches!(
            manager.unlock("main", TEST_PASSWORD),
            Err(WalletError::Authentication)
        );
    }

    #[test]
    fn test_corrupt_store_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);
        manager.create_wallet("main", TEST_PASSWORD, Network::Mainnet).unwrap();

        let path = temp_dir.path().join("wallet-home").join("wallets.json");
        fs::write(&path, b"not json").unwrap();

        assert_matches!(manager.list_wallets(), Err(WalletError::Storage(_)));
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

mod configuration {
    use super::*;
    use zeroize::Zeroizing;

    #[test]
    fn test_first_run_defaults() {
        let (_, manager) = memory_manager();
        let config = manager.load_config().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(manager.get_active_wallet().unwrap(), None);
    }

    #[test]
    fn test_api_key_stripped_on_save() {
        let (storage, manager) = memory_manager();

        let mut config = manager.load_config().unwrap();
        config.api_key = Some(Zeroizing::new("sk-live-0123456789".to_string()));
        config.rpc_endpoint = "https://rpc.example.org".to_string();
        manager.save_config(&config).unwrap();

        let raw = String::from_utf8(storage.raw(StoreFile::Config).unwrap()).unwrap();
        assert!(!raw.contains("sk-live-0123456789"));

        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.rpc_endpoint, "https://rpc.example.org");
        assert!(loaded.api_key.is_none());
    }

    #[test]
    fn test_hand_edited_partial_config() {
        let (storage, manager) = memory_manager();
        storage
            .write(StoreFile::Config, br#"{"network":"testnet"}"#)
            .unwrap();

        let config = manager.load_config().unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.rpc_endpoint, Network::Testnet.default_rpc_endpoint());
        assert_eq!(config.active_wallet, None);
    }
}

// ============================================================================
// Signing Tests
// ============================================================================

mod signing {
    use super::*;

    #[test]
    fn test_unlocked_wallet_signs_for_its_address() {
        let (_, manager) = memory_manager();
        manager
            .import_wallet("imp", TEST_MNEMONIC_12, TEST_PASSWORD, Network::Mainnet)
            .unwrap();

        let unlocked = manager.unlock("imp", TEST_PASSWORD).unwrap();
        let signature = unlocked.sign(b"transfer 10 tokens");
        let public_key = parse_address(unlocked.address()).unwrap();
        unlocked.lock();

        assert!(verify(b"transfer 10 tokens", &signature, &public_key));
        assert!(!verify(b"transfer 99 tokens", &signature, &public_key));
    }
}
