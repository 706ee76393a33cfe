//! Re-encryption of secret fields for the importing environment.

use super::{KdfParams, KeyRing, SecretKey, SecretResult, decrypt_string, encrypt_string};
use crate::transfer::domain::{EntityRecord, KeyId};
use tracing::warn;

/// A record after rekeying, with any non-fatal warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct RekeyOutcome {
    /// The record to persist.
    pub record: EntityRecord,
    /// Fields that could not be rekeyed, in declaration order.
    pub warnings: Vec<String>,
}

impl RekeyOutcome {
    const fn unchanged(record: EntityRecord) -> Self {
        Self {
            record,
            warnings: Vec::new(),
        }
    }
}

/// Converts secret fields from the exporting key to the importing key.
///
/// Built once per import run: the target key is derived up front, so the
/// Argon2 cost is paid once rather than per entity.
#[derive(Debug)]
pub struct SecretRekeyer {
    source_id: Option<KeyId>,
    source: Option<SecretKey>,
    target: SecretKey,
    explicit_target: bool,
}

impl SecretRekeyer {
    /// Prepares a rekeyer for one run.
    ///
    /// The source key is resolved from `keys` by `source_key_id`. The target
    /// key is derived from `rekey_secret` when given, otherwise it is the key
    /// ring's active key.
    ///
    /// # Errors
    ///
    /// Returns [`super::SecretError::KeyDerivation`] when the rekey secret
    /// cannot be turned into a key.
    pub fn new(
        keys: &KeyRing,
        source_key_id: Option<&KeyId>,
        rekey_secret: Option<&str>,
        kdf: &KdfParams,
    ) -> SecretResult<Self> {
        let target = match rekey_secret {
            Some(secret) => SecretKey::derive(secret, kdf)?,
            None => keys.active().clone(),
        };
        Ok(Self {
            source_id: source_key_id.cloned(),
            source: source_key_id.and_then(|key_id| keys.get(key_id)).cloned(),
            target,
            explicit_target: rekey_secret.is_some(),
        })
    }

    /// Returns the fingerprint of the key secrets are converted to.
    #[must_use]
    pub fn target_key_id(&self) -> KeyId {
        self.target.id()
    }

    /// Rekeys every secret field of `record`.
    ///
    /// Fields that cannot be converted are left as they are and reported as
    /// warnings; rekeying never fails the import.
    #[must_use]
    pub fn rekey(&self, record: EntityRecord) -> RekeyOutcome {
        if record.secret_fields().is_empty()
            || self.source_id.as_ref() == Some(&self.target.id())
        {
            return RekeyOutcome::unchanged(record);
        }

        let mut rekeyed = record.clone();
        let mut warnings = Vec::new();
        for field in record.secret_fields() {
            let converted = record
                .secret_value(field)
                .and_then(|ciphertext| self.convert(ciphertext));
            match converted {
                Some(ciphertext) => rekeyed.replace_secret(field, ciphertext),
                None => {
                    let message = format!(
                        "secret field '{field}' on entity {} could not be rekeyed; value may be unusable in this environment",
                        record.key()
                    );
                    warn!(entity = %record.key(), field = %field, "secret field left unconverted");
                    warnings.push(message);
                }
            }
        }

        RekeyOutcome {
            record: rekeyed,
            warnings,
        }
    }

    fn convert(&self, ciphertext: &str) -> Option<String> {
        if !self.explicit_target {
            return None;
        }
        let source = self.source.as_ref()?;
        let plaintext = decrypt_string(source, ciphertext).ok()?;
        encrypt_string(&self.target, &plaintext).ok()
    }
}
