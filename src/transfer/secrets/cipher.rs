//! Authenticated string encryption using ChaCha20-Poly1305.

use super::{SecretError, SecretKey, SecretResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts a string and returns base64 of `nonce || ciphertext`.
///
/// # Errors
///
/// Returns [`SecretError::Encryption`] when the cipher rejects the input.
pub fn encrypt_string(key: &SecretKey, plaintext: &str) -> SecretResult<String> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|err| SecretError::Encryption(err.to_string()))?;

    let mut encoded = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    encoded.extend_from_slice(&nonce_bytes);
    encoded.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(encoded))
}

/// Decrypts a base64-encoded `nonce || ciphertext` string.
///
/// # Errors
///
/// Returns [`SecretError::Decryption`] when the encoding is invalid, the data
/// is truncated, the key is wrong or the ciphertext was tampered with.
pub fn decrypt_string(key: &SecretKey, encoded: &str) -> SecretResult<String> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|err| SecretError::Decryption(format!("invalid base64: {err}")))?;

    if bytes.len() < NONCE_SIZE + TAG_SIZE {
        return Err(SecretError::Decryption("data too short".to_owned()));
    }
    let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);

    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| {
            SecretError::Decryption("wrong key or tampered data".to_owned())
        })?;

    String::from_utf8(plaintext)
        .map_err(|err| SecretError::Decryption(format!("invalid UTF-8: {err}")))
}
