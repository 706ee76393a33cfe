//! Catalog-held entity aggregate.

use super::{EntityId, EntityKey, EntityRecord};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A record as held by the catalog, with its catalog-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntity {
    id: EntityId,
    record: EntityRecord,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted entity.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedEntityData {
    /// Persisted identifier.
    pub id: EntityId,
    /// Persisted record contents.
    pub record: EntityRecord,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl StoredEntity {
    /// Wraps a record under a fresh identity.
    #[must_use]
    pub fn new(record: EntityRecord, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: EntityId::new(),
            record,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an entity from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedEntityData) -> Self {
        Self {
            id: data.id,
            record: data.record,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the catalog identity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the record contents.
    #[must_use]
    pub const fn record(&self) -> &EntityRecord {
        &self.record
    }

    /// Consumes the entity and returns its record.
    #[must_use]
    pub fn into_record(self) -> EntityRecord {
        self.record
    }

    /// Returns the (type, name) key.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        self.record.key()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy carrying `incoming` contents under this identity.
    ///
    /// The stored name is kept, so an update can never move an entity to a
    /// different key.
    #[must_use]
    pub fn overwritten_with(&self, incoming: EntityRecord, clock: &impl Clock) -> Self {
        let name = self.record.name().to_owned();
        Self {
            id: self.id,
            record: incoming.renamed(name),
            created_at: self.created_at,
            updated_at: clock.utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::domain::EntityType;
    use mockable::DefaultClock;
    use serde_json::json;

    #[test]
    fn overwrite_keeps_identity_and_creation_time() {
        let clock = DefaultClock;
        let original = StoredEntity::new(
            EntityRecord::new(EntityType::Server, "prod-server").with_field("port", json!(80)),
            &clock,
        );
        let incoming =
            EntityRecord::new(EntityType::Server, "prod-server").with_field("port", json!(443));

        let updated = original.overwritten_with(incoming, &clock);

        assert_eq!(updated.id(), original.id());
        assert_eq!(updated.created_at(), original.created_at());
        assert_eq!(updated.record().fields().get("port"), Some(&json!(443)));
        assert!(updated.updated_at() >= original.updated_at());
    }
}
