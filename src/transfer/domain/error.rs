//! Error types for transfer domain validation and parsing.

use super::{EntityKey, EntityType};
use thiserror::Error;

/// Errors returned while constructing or validating transfer domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferDomainError {
    /// The entity name is empty after trimming.
    #[error("{0} name must not be empty")]
    EmptyEntityName(EntityType),

    /// The entity name exceeds the storage limit.
    #[error("{0} name exceeds 255 character limit")]
    EntityNameTooLong(EntityKey),

    /// A field listed as secret is absent from the record's fields.
    #[error("secret field '{field}' is missing on {key}")]
    MissingSecretField {
        /// Entity carrying the declaration.
        key: EntityKey,
        /// Declared secret field name.
        field: String,
    },

    /// A field listed as secret does not hold a string ciphertext.
    #[error("secret field '{field}' on {key} must be a string")]
    NonStringSecretField {
        /// Entity carrying the declaration.
        key: EntityKey,
        /// Declared secret field name.
        field: String,
    },

    /// A referenced entity exists neither in the catalog nor earlier in the run.
    #[error("{key} depends on {dependency}, which does not exist")]
    UnresolvedDependency {
        /// Entity carrying the reference.
        key: EntityKey,
        /// Missing referenced entity.
        dependency: EntityKey,
    },

    /// No free rename suffix remains for a conflicting entity.
    #[error("no free rename suffix remains for {0}")]
    RenameSuffixExhausted(EntityKey),

    /// The schema version string is not `major.minor`.
    #[error("invalid schema version '{0}' (expected 'major.minor')")]
    InvalidSchemaVersion(String),

    /// Declared entity counts disagree with the entity lists.
    #[error("payload declares {declared} {entity_type} but contains {actual}")]
    EntityCountMismatch {
        /// Entity type whose count disagrees.
        entity_type: EntityType,
        /// Count declared in payload metadata.
        declared: usize,
        /// Number of records actually present.
        actual: usize,
    },

    /// A record is filed under a type key other than its own.
    #[error("{key} is listed under '{listed_under}'")]
    MisfiledEntity {
        /// The record's own key.
        key: EntityKey,
        /// Type key the record was listed under.
        listed_under: EntityType,
    },

    /// The key identifier is not lowercase hexadecimal.
    #[error("invalid key identifier '{0}'")]
    InvalidKeyId(String),

    /// A selective import expression could not be parsed.
    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] ParseEntityTypeError),
}

/// Error returned while parsing an entity type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown entity type: {0}")]
pub struct ParseEntityTypeError(pub String);

/// Error returned while parsing a conflict strategy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown conflict strategy: {0} (expected skip, update, rename or fail)")]
pub struct ParseConflictStrategyError(pub String);
