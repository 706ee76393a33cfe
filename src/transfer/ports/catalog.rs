//! Catalog port for the gateway configuration store.

use crate::transfer::domain::{EntityId, EntityKey, EntityType, StoredEntity};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Stable identity of a catalog instance.
///
/// Committing imports are serialized per identity, so two handles onto the
/// same store must report the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogIdentity(String);

impl CatalogIdentity {
    /// Creates a catalog identity.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Read and write access to the gateway configuration store.
///
/// Implementations enforce name uniqueness within an entity type. They are
/// not required to be transactional; the import engine keeps its own undo
/// log.
#[async_trait]
pub trait EntityCatalog: Send + Sync {
    /// Returns the identity used to serialize committing imports.
    fn identity(&self) -> CatalogIdentity;

    /// Finds an entity by (type, name).
    async fn find(&self, key: &EntityKey) -> CatalogResult<Option<StoredEntity>>;

    /// Returns whether an entity with the given key exists.
    async fn exists(&self, key: &EntityKey) -> CatalogResult<bool> {
        Ok(self.find(key).await?.is_some())
    }

    /// Lists the entities of one type in the catalog's stable enumeration
    /// order.
    async fn list(&self, entity_type: EntityType) -> CatalogResult<Vec<StoredEntity>>;

    /// Stores a new entity.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateEntity`] when the identifier exists or
    /// [`CatalogError::DuplicateName`] when the key is already taken.
    async fn insert(&self, entity: &StoredEntity) -> CatalogResult<()>;

    /// Stores several new entities, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first insert that fails. Entities before it
    /// stay stored.
    async fn insert_all(&self, entities: &[StoredEntity]) -> CatalogResult<()> {
        for entity in entities {
            self.insert(entity).await?;
        }
        Ok(())
    }

    /// Persists new contents for an existing entity.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the entity does not exist.
    async fn update(&self, entity: &StoredEntity) -> CatalogResult<()>;

    /// Removes an entity.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the entity does not exist.
    async fn delete(&self, entity_id: EntityId) -> CatalogResult<()>;
}

/// Errors returned by catalog implementations.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// An entity with the same identifier already exists.
    #[error("duplicate entity identifier: {0}")]
    DuplicateEntity(EntityId),

    /// An entity with the same (type, name) already exists.
    #[error("duplicate entity name: {0}")]
    DuplicateName(EntityKey),

    /// The entity was not found.
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted entity data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CatalogError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
