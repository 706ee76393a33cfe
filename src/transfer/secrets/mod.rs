//! Secret field encryption and cross-environment rekeying.
//!
//! Secret fields hold ChaCha20-Poly1305 ciphertext encoded as base64 of
//! `nonce || ciphertext`. Keys are 256-bit, derived from operator secrets with
//! Argon2id over a fixed application salt so that the same secret yields the
//! same key in every environment.

mod cipher;
mod error;
mod key;
mod rekey;

pub use cipher::{NONCE_SIZE, TAG_SIZE, decrypt_string, encrypt_string};
pub use error::{SecretError, SecretResult};
pub use key::{KEY_SIZE, KdfParams, KeyRing, SecretKey};
pub use rekey::{RekeyOutcome, SecretRekeyer};
