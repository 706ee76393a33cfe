//! Self-describing export payload.

use super::{EntityKey, EntityRecord, EntityType, KeyId, TransferDomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Payload schema version in `major.minor` form.
///
/// Versions compare by major then minor; importers reject payloads newer than
/// the version they support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    major: u32,
    minor: u32,
}

impl SchemaVersion {
    /// Schema version written by this crate.
    pub const CURRENT: Self = Self::new(1, 0);

    /// Creates a schema version.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns the major component.
    #[must_use]
    pub const fn major(self) -> u32 {
        self.major
    }

    /// Returns the minor component.
    #[must_use]
    pub const fn minor(self) -> u32 {
        self.minor
    }

    /// Parses `major.minor`; a bare `major` means `major.0`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferDomainError::InvalidSchemaVersion`] for any other
    /// shape.
    pub fn parse(value: &str) -> Result<Self, TransferDomainError> {
        let invalid = || TransferDomainError::InvalidSchemaVersion(value.to_owned());
        let trimmed = value.trim();
        let (major_part, minor_part) = trimmed.split_once('.').unwrap_or((trimmed, "0"));
        let major = major_part.parse::<u32>().map_err(|_| invalid())?;
        let minor = minor_part.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self::new(major, minor))
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.major, self.minor)
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = TransferDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaVersion> for String {
    fn from(value: SchemaVersion) -> Self {
        value.to_string()
    }
}

/// Export provenance recorded alongside the entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadHeader {
    /// Export timestamp.
    pub exported_at: DateTime<Utc>,
    /// Operator or principal that requested the export.
    pub exported_by: String,
    /// Identity of the exporting gateway.
    pub source_identity: String,
    /// Key that encrypted the secret fields, when known.
    pub source_key_id: Option<KeyId>,
}

/// Summary metadata carried by a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMetadata {
    /// Number of records per entity type.
    #[serde(default)]
    pub entity_counts: BTreeMap<EntityType, usize>,
}

/// A complete export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    schema_version: SchemaVersion,
    exported_at: DateTime<Utc>,
    exported_by: String,
    source_identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_key_id: Option<KeyId>,
    #[serde(default)]
    entities: BTreeMap<EntityType, Vec<EntityRecord>>,
    #[serde(default)]
    metadata: PayloadMetadata,
}

impl ExportPayload {
    /// Builds a payload at the current schema version.
    ///
    /// Every entity type is present in both the entity map and the counts,
    /// including types with no records.
    #[must_use]
    pub fn new(header: PayloadHeader, mut entities: BTreeMap<EntityType, Vec<EntityRecord>>) -> Self {
        for entity_type in EntityType::ALL {
            entities.entry(entity_type).or_default();
        }
        let entity_counts = entities
            .iter()
            .map(|(entity_type, records)| (*entity_type, records.len()))
            .collect();

        Self {
            schema_version: SchemaVersion::CURRENT,
            exported_at: header.exported_at,
            exported_by: header.exported_by,
            source_identity: header.source_identity,
            source_key_id: header.source_key_id,
            entities,
            metadata: PayloadMetadata { entity_counts },
        }
    }

    /// Overrides the schema version, for payloads produced by other versions.
    #[must_use]
    pub const fn with_schema_version(mut self, schema_version: SchemaVersion) -> Self {
        self.schema_version = schema_version;
        self
    }

    /// Returns the schema version.
    #[must_use]
    pub const fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }

    /// Returns the export timestamp.
    #[must_use]
    pub const fn exported_at(&self) -> DateTime<Utc> {
        self.exported_at
    }

    /// Returns the exporting principal.
    #[must_use]
    pub fn exported_by(&self) -> &str {
        &self.exported_by
    }

    /// Returns the exporting gateway identity.
    #[must_use]
    pub fn source_identity(&self) -> &str {
        &self.source_identity
    }

    /// Returns the key that encrypted secret fields, if recorded.
    #[must_use]
    pub const fn source_key_id(&self) -> Option<&KeyId> {
        self.source_key_id.as_ref()
    }

    /// Returns the records of one type in payload order.
    #[must_use]
    pub fn entities(&self, entity_type: EntityType) -> &[EntityRecord] {
        self.entities.get(&entity_type).map_or(&[], Vec::as_slice)
    }

    /// Returns the declared per-type counts.
    #[must_use]
    pub const fn counts(&self) -> &BTreeMap<EntityType, usize> {
        &self.metadata.entity_counts
    }

    /// Returns the declared count for one type.
    #[must_use]
    pub fn count(&self, entity_type: EntityType) -> usize {
        self.metadata
            .entity_counts
            .get(&entity_type)
            .copied()
            .unwrap_or_default()
    }

    /// Returns the total number of records declared by the payload.
    #[must_use]
    pub fn total(&self) -> usize {
        self.metadata.entity_counts.values().sum()
    }

    /// Returns whether the payload carries a record with the given key.
    #[must_use]
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities(key.entity_type)
            .iter()
            .any(|record| record.name() == key.name)
    }

    /// Checks that declared counts match the entity lists and that every
    /// record is filed under its own type.
    ///
    /// # Errors
    ///
    /// Returns [`TransferDomainError::EntityCountMismatch`] or
    /// [`TransferDomainError::MisfiledEntity`] for the first inconsistency.
    pub fn check_consistency(&self) -> Result<(), TransferDomainError> {
        for entity_type in EntityType::ALL {
            let records = self.entities(entity_type);
            let declared = self.count(entity_type);
            if declared != records.len() {
                return Err(TransferDomainError::EntityCountMismatch {
                    entity_type,
                    declared,
                    actual: records.len(),
                });
            }
            if let Some(misfiled) = records
                .iter()
                .find(|record| record.entity_type() != entity_type)
            {
                return Err(TransferDomainError::MisfiledEntity {
                    key: misfiled.key(),
                    listed_under: entity_type,
                });
            }
        }
        Ok(())
    }
}
