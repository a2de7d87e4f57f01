//! Argon2id + AES-256-GCM encrypted secret files.
//!
//! Each document is the plaintext JSON of [`FileSecretStore`](crate::FileSecretStore),
//! sealed as follows:
//! 1. Argon2id derives a 32-byte key from the passphrase + a random salt
//! 2. AES-256-GCM encrypts the document with a random nonce
//! 3. The envelope is stored as JSON with all parameters needed to decrypt it

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use ballot_types::{Address, Commitment};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use crate::error::StoreError;
use crate::file::{Codec, RecordDir, SecretsDocument};
use crate::record::SecretRecord;
use crate::SecretStore;

const ENVELOPE_VERSION: u32 = 1;
const SALT_LEN: usize = 32;
/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// Argon2id cost parameters, recorded in every envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MiB, 3 passes, 1 lane.
    fn default() -> Self {
        Self {
            memory: 65536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    crypto: EnvelopeCrypto,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnvelopeCrypto {
    cipher: String,
    kdf: String,
    kdf_params: KdfParams,
    /// Hex-encoded.
    salt: String,
    /// Hex-encoded.
    nonce: String,
    /// Hex-encoded.
    ciphertext: String,
}

fn derive_key(
    passphrase: &str,
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, StoreError> {
    let params = Params::new(params.memory, params.iterations, params.parallelism, Some(32))
        .map_err(|e| StoreError::Encryption(format!("argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|e| StoreError::Encryption(format!("argon2: {e}")))?;
    Ok(key)
}

fn random_bytes<const N: usize>() -> Result<[u8; N], StoreError> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes).map_err(|e| StoreError::Encryption(e.to_string()))?;
    Ok(bytes)
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, StoreError> {
    hex::decode(value).map_err(|e| StoreError::Serialization(format!("invalid {field} hex: {e}")))
}

struct Sealed<'a> {
    passphrase: &'a str,
    params: KdfParams,
}

impl Codec for Sealed<'_> {
    fn encode(
        &self,
        contract: &Address,
        voter: &Address,
        records: &[SecretRecord],
    ) -> Result<Vec<u8>, StoreError> {
        let plaintext = Zeroizing::new(SecretsDocument::to_json(contract, voter, records)?);
        let salt = random_bytes::<SALT_LEN>()?;
        let nonce = random_bytes::<NONCE_LEN>()?;
        let key = derive_key(self.passphrase, &salt, &self.params)?;

        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| StoreError::Encryption(format!("AES key init failed: {e}")))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|e| StoreError::Encryption(format!("encryption failed: {e}")))?;

        let envelope = Envelope {
            version: ENVELOPE_VERSION,
            crypto: EnvelopeCrypto {
                cipher: "aes-256-gcm".into(),
                kdf: "argon2id".into(),
                kdf_params: self.params,
                salt: hex::encode(salt),
                nonce: hex::encode(nonce),
                ciphertext: hex::encode(ciphertext),
            },
        };
        serde_json::to_vec_pretty(&envelope).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<SecretRecord>, StoreError> {
        let envelope: Envelope =
            serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(StoreError::UnsupportedVersion(envelope.version));
        }
        let crypto = envelope.crypto;
        let salt = decode_hex("salt", &crypto.salt)?;
        let nonce = decode_hex("nonce", &crypto.nonce)?;
        let ciphertext = decode_hex("ciphertext", &crypto.ciphertext)?;
        if nonce.len() != NONCE_LEN {
            return Err(StoreError::Serialization(format!(
                "invalid nonce length: expected {NONCE_LEN}, got {}",
                nonce.len()
            )));
        }

        // Envelopes carry their own cost parameters so they stay readable if defaults change.
        let key = derive_key(self.passphrase, &salt, &crypto.kdf_params)?;
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| StoreError::Encryption(format!("AES key init failed: {e}")))?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
                .map_err(|_| StoreError::Decryption)?,
        );
        SecretsDocument::from_json(&plaintext)
    }
}

/// Secret files encrypted at rest under a passphrase.
pub struct EncryptedSecretStore {
    files: RecordDir,
    passphrase: Zeroizing<String>,
    params: KdfParams,
}

impl EncryptedSecretStore {
    pub fn open(dir: impl Into<PathBuf>, passphrase: impl Into<String>) -> Result<Self, StoreError> {
        let passphrase = Zeroizing::new(passphrase.into());
        if passphrase.is_empty() {
            return Err(StoreError::Encryption("passphrase must not be empty".into()));
        }
        Ok(Self {
            files: RecordDir::open(dir, "enc.json")?,
            passphrase,
            params: KdfParams::default(),
        })
    }

    /// Override the Argon2id cost for newly written envelopes.
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.params = params;
        self
    }

    pub fn dir(&self) -> &Path {
        self.files.dir()
    }

    fn codec(&self) -> Sealed<'_> {
        Sealed {
            passphrase: &self.passphrase,
            params: self.params,
        }
    }
}

impl SecretStore for EncryptedSecretStore {
    fn save(&self, record: &SecretRecord) -> Result<(), StoreError> {
        self.files.save(&self.codec(), record)
    }

    fn load(&self, contract: &Address, voter: &Address) -> Result<Vec<SecretRecord>, StoreError> {
        self.files.read(&self.codec(), contract, voter)
    }

    fn discard(
        &self,
        contract: &Address,
        voter: &Address,
        commitment: &Commitment,
    ) -> Result<bool, StoreError> {
        self.files.discard(&self.codec(), contract, voter, commitment)
    }

    fn clear(&self, contract: &Address, voter: &Address) -> Result<(), StoreError> {
        self.files.clear(contract, voter)
    }
}
