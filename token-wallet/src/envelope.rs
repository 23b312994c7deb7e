//! Password Envelope
//!
//! Seals a secret under a password:
//! - PBKDF2-HMAC-SHA256 derives a 256-bit key from the password and a fresh
//!   32-byte salt
//! - AES-256-GCM with a fresh 16-byte IV encrypts and authenticates it
//!
//! The envelope serializes as
//! `{salt, iv, authTag, encrypted, iterations}` with every byte string hex
//! encoded. Envelopes written before `iterations` was recorded deserialize
//! with [`DEFAULT_KDF_ITERATIONS`].

use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::secmem::SecretString;

/// AES-256-GCM with a 128-bit IV
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// PBKDF2 rounds used for newly sealed envelopes
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Lowest cost accepted when sealing or opening
pub const MIN_KDF_ITERATIONS: u32 = 1_000;

/// Highest cost accepted when opening; bounds the work a tampered file can
/// demand
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

const SALT_LEN: usize = 32;
const IV_LEN: usize = 16;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

fn default_iterations() -> u32 {
    DEFAULT_KDF_ITERATIONS
}

/// A password-sealed secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// PBKDF2 salt (32 bytes, hex encoded)
    salt: String,

    /// AES-GCM initialization vector (16 bytes, hex encoded)
    iv: String,

    /// AES-GCM authentication tag (16 bytes, hex encoded)
    auth_tag: String,

    /// Ciphertext without the tag (hex encoded)
    encrypted: String,

    /// PBKDF2 iteration count used to derive the key
    #[serde(default = "default_iterations")]
    iterations: u32,
}

impl Envelope {
    /// Seal `plaintext` under `password` at the default KDF cost.
    pub fn seal(plaintext: &str, password: &str) -> Result<Self, WalletError> {
        Self::seal_with_iterations(plaintext, password, DEFAULT_KDF_ITERATIONS)
    }

    /// Seal `plaintext` under `password` with an explicit KDF cost.
    ///
    /// `iterations` is clamped to
    /// [`MIN_KDF_ITERATIONS`]..=[`MAX_KDF_ITERATIONS`].
    pub fn seal_with_iterations(
        plaintext: &str,
        password: &str,
        iterations: u32,
    ) -> Result<Self, WalletError> {
        let iterations = iterations.clamp(MIN_KDF_ITERATIONS, MAX_KDF_ITERATIONS);

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let key = derive_key(password, &salt, iterations);
        let cipher =
            Aes256Gcm16::new_from_slice(&key[..]).map_err(|_| WalletError::Authentication)?;

        let mut buffer = Zeroizing::new(plaintext.as_bytes().to_vec());
        let tag = cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| WalletError::Authentication)?;

        Ok(Self {
            salt: hex::encode(salt),
            iv: hex::encode(iv),
            auth_tag: hex::encode(tag),
            encrypted: hex::encode(&buffer[..]),
            iterations,
        })
    }

    /// Recover the plaintext.
    ///
    /// Every failure (wrong password, malformed field, tag mismatch) is the
    /// same [`WalletError::Authentication`].
    pub fn open(&self, password: &str) -> Result<SecretString, WalletError> {
        if !(MIN_KDF_ITERATIONS..=MAX_KDF_ITERATIONS).contains(&self.iterations) {
            return Err(WalletError::Authentication);
        }

        let salt = decode_exact(&self.salt, SALT_LEN)?;
        let iv = decode_exact(&self.iv, IV_LEN)?;
        let tag = decode_exact(&self.auth_tag, TAG_LEN)?;
        let mut buffer =
            Zeroizing::new(hex::decode(&self.encrypted).map_err(|_| WalletError::Authentication)?);

        let key = derive_key(password, &salt, self.iterations);
        let cipher =
            Aes256Gcm16::new_from_slice(&key[..]).map_err(|_| WalletError::Authentication)?;

        cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(&iv),
                b"",
                &mut buffer,
                Tag::<U16>::from_slice(&tag),
            )
            .map_err(|_| WalletError::Authentication)?;

        let plaintext = std::str::from_utf8(&buffer).map_err(|_| WalletError::Authentication)?;
        Ok(SecretString::new(plaintext))
    }

    /// KDF iteration count recorded in this envelope
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

/// Derive a 32-byte encryption key from password using PBKDF2-HMAC-SHA256
fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key[..]);
    key
}

fn decode_exact(field: &str, len: usize) -> Result<Vec<u8>, WalletError> {
    match hex::decode(field) {
        Ok(bytes) if bytes.len() == len => Ok(bytes),
        _ => Err(WalletError::Authentication),
    }
}
