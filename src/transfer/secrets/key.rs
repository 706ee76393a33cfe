//! Key derivation, key identity and the environment key ring.

use super::{SecretError, SecretResult};
use crate::transfer::domain::KeyId;
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of encryption keys in bytes (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// Salt shared by every environment so a secret maps to one key everywhere.
const APPLICATION_SALT: &[u8; 16] = b"gw-config-rekey1";

/// Number of digest bytes kept in a key identifier.
const KEY_ID_BYTES: usize = 8;

/// A 256-bit encryption key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Generates a random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Derives a key from an operator secret using Argon2id.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::KeyDerivation`] when the parameters are rejected.
    pub fn derive(secret: &str, params: &KdfParams) -> SecretResult<Self> {
        let argon2_params = Params::new(
            params.memory_cost_kib,
            params.time_cost,
            params.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|err| SecretError::KeyDerivation(err.to_string()))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut bytes = [0u8; KEY_SIZE];
        argon2
            .hash_password_into(secret.as_bytes(), APPLICATION_SALT, &mut bytes)
            .map_err(|err| SecretError::KeyDerivation(err.to_string()))?;
        Ok(Self { bytes })
    }

    /// Returns the key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Returns the key fingerprint.
    #[must_use]
    pub fn id(&self) -> KeyId {
        let digest = Sha256::digest(self.bytes);
        let prefix: Vec<u8> = digest.iter().take(KEY_ID_BYTES).copied().collect();
        KeyId::from_fingerprint(hex::encode(prefix))
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SecretKey")
            .field("id", &self.id())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id parameters used to derive keys from rekey secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost_kib: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP recommendation for Argon2id.
        Self {
            memory_cost_kib: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for tests and tooling. Not for production secrets.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Keys known to the importing environment.
///
/// The active key encrypts secrets at rest. Other known keys, typically those
/// of peer environments, let the rekeyer decrypt incoming ciphertext.
#[derive(Debug, Clone)]
pub struct KeyRing {
    active: SecretKey,
    known: HashMap<KeyId, SecretKey>,
}

impl KeyRing {
    /// Creates a key ring with a single active key.
    #[must_use]
    pub fn new(active: SecretKey) -> Self {
        let mut known = HashMap::new();
        known.insert(active.id(), active.clone());
        Self { active, known }
    }

    /// Adds a known key.
    #[must_use]
    pub fn with_key(mut self, key: SecretKey) -> Self {
        self.known.insert(key.id(), key);
        self
    }

    /// Returns the active key.
    #[must_use]
    pub const fn active(&self) -> &SecretKey {
        &self.active
    }

    /// Looks up a known key by fingerprint.
    #[must_use]
    pub fn get(&self, key_id: &KeyId) -> Option<&SecretKey> {
        self.known.get(key_id)
    }
}
