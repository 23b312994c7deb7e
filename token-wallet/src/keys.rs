//! Key Management
//!
//! Handles BIP39 mnemonic generation and SLIP-0010 Ed25519 key derivation
//! along the Solana account path `m/44'/501'/0'/0'`.
//!
//! Security: mnemonic phrases live in [`SecretString`] buffers that are
//! locked into RAM and scrubbed on drop. The Ed25519 signing key zeroizes
//! itself on drop.

use bip39::{Language, Mnemonic, MnemonicType, Seed};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::secmem::SecretString;

/// [Hardened derivation](https://github.com/bitcoin/bips/blob/master/bip-0043.mediawiki#Security) flag for path components
const HARDENED: u32 = 0x8000_0000;

/// BIP44 purpose
const USAGE_BIP44: u32 = 44;

/// SLIP-0044 coin type for Solana
const COINTYPE_SOLANA: u32 = 501;

/// `m/44'/501'/0'/0'`
pub const DERIVATION_PATH: [u32; 4] = [
    HARDENED | USAGE_BIP44,
    HARDENED | COINTYPE_SOLANA,
    HARDENED,
    HARDENED,
];

/// Size of an Ed25519 signature in bytes
pub const SIGNATURE_LENGTH: usize = 64;

/// Entropy strength of a generated recovery phrase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MnemonicStrength {
    /// 128 bits of entropy
    Words12,
    /// 256 bits of entropy
    #[default]
    Words24,
}

impl MnemonicStrength {
    /// Strength for a given word count, if it is one we accept
    pub fn from_word_count(count: usize) -> Option<Self> {
        match count {
            12 => Some(Self::Words12),
            24 => Some(Self::Words24),
            _ => None,
        }
    }

    fn mnemonic_type(self) -> MnemonicType {
        match self {
            Self::Words12 => MnemonicType::Words12,
            Self::Words24 => MnemonicType::Words24,
        }
    }
}

/// Wallet keys derived from a BIP39 mnemonic.
pub struct WalletKeys {
    /// Recovery phrase, normalized to single-spaced lowercase words
    mnemonic_phrase: SecretString,

    /// Ed25519 keypair at [`DERIVATION_PATH`]
    signing_key: SigningKey,
}

impl Clone for WalletKeys {
    fn clone(&self) -> Self {
        Self {
            mnemonic_phrase: self.mnemonic_phrase.clone(),
            signing_key: self.signing_key.clone(),
        }
    }
}

impl WalletKeys {
    /// Generate a new wallet with a random mnemonic
    pub fn generate(strength: MnemonicStrength) -> Self {
        let mnemonic = Mnemonic::new(strength.mnemonic_type(), Language::English);
        Self::from_validated(&mnemonic)
    }

    /// Restore a wallet from a mnemonic phrase.
    ///
    /// Only checksum-valid 12- and 24-word English phrases are accepted.
    pub fn from_mnemonic(phrase: &str) -> Result<Self, WalletError> {
        let mnemonic = parse_mnemonic(phrase)?;
        Ok(Self::from_validated(&mnemonic))
    }

    fn from_validated(mnemonic: &Mnemonic) -> Self {
        let mnemonic_phrase = SecretString::new(mnemonic.phrase());

        // No BIP39 passphrase
        let seed = Seed::new(mnemonic, "");
        let secret = Zeroizing::new(slip10_ed25519::derive_ed25519_private_key(
            seed.as_bytes(),
            &DERIVATION_PATH,
        ));
        let signing_key = SigningKey::from_bytes(&secret);

        Self {
            mnemonic_phrase,
            signing_key,
        }
    }

    /// Get the mnemonic phrase as a string
    pub fn mnemonic_phrase(&self) -> &str {
        self.mnemonic_phrase.as_str()
    }

    /// Get the mnemonic words as a vector
    pub fn mnemonic_words(&self) -> Vec<&str> {
        self.mnemonic_phrase().split_whitespace().collect()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key().to_bytes()
    }

    /// Base58 address of the public key
    pub fn address(&self) -> String {
        bs58::encode(self.public_key_bytes()).into_string()
    }

    /// Sign a message with the wallet's private key
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.signing_key.sign(message).to_bytes()
    }

    /// The 64-byte `secret || public` keypair layout used by the Solana CLI
    pub fn keypair_bytes(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    /// Returns true if the mnemonic memory is locked (protected from swapping).
    pub fn is_memory_locked(&self) -> bool {
        self.mnemonic_phrase.is_memory_locked()
    }
}

impl fmt::Debug for WalletKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKeys")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Trim, collapse whitespace and lowercase a user-entered phrase
pub fn normalize_phrase(phrase: &str) -> Zeroizing<String> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    Zeroizing::new(words.join(" ").to_lowercase())
}

/// Validate a mnemonic phrase without creating keys
pub fn validate_mnemonic(phrase: &str) -> Result<(), WalletError> {
    parse_mnemonic(phrase).map(|_| ())
}

fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = normalize_phrase(phrase);

    let word_count = normalized.split_whitespace().count();
    if MnemonicStrength::from_word_count(word_count).is_none() {
        return Err(WalletError::InvalidPhrase(format!(
            "expected 12 or 24 words, got {}",
            word_count
        )));
    }

    // The library error can quote the offending word; keep it out of the message.
    Mnemonic::from_phrase(&normalized, Language::English).map_err(|_| {
        WalletError::InvalidPhrase("unknown word or checksum mismatch".to_string())
    })
}

/// Verify an Ed25519 signature against a raw public key
pub fn verify(message: &[u8], signature: &[u8], public_key: &[u8; 32]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}

/// Decode a base58 address back into public key bytes
pub fn parse_address(address: &str) -> Option<[u8; 32]> {
    let bytes = bs58::decode(address.trim()).into_vec().ok()?;
    bytes.try_into().ok()
}
