//! Error types for secret handling.

use thiserror::Error;

/// Result type for secret operations.
pub type SecretResult<T> = Result<T, SecretError>;

/// Errors returned while deriving keys or transforming ciphertext.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecretError {
    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed.
    #[error("decryption failed: {0}")]
    Decryption(String),
}
