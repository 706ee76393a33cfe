//! In-memory catalog of stored entities.

use crate::transfer::{
    domain::{EntityId, EntityKey, EntityType, StoredEntity},
    ports::{CatalogError, CatalogIdentity, CatalogResult, EntityCatalog},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Thread-safe in-memory entity catalog.
///
/// Entities enumerate in insertion order. Clones share state and identity.
#[derive(Debug, Clone)]
pub struct InMemoryEntityCatalog {
    identity: CatalogIdentity,
    state: Arc<RwLock<InMemoryCatalogState>>,
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    entities: HashMap<EntityId, StoredEntity>,
    key_index: HashMap<EntityKey, EntityId>,
    order: Vec<EntityId>,
}

impl InMemoryEntityCatalog {
    /// Creates an empty catalog with a unique identity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_identity(CatalogIdentity::new(format!("memory:{}", Uuid::new_v4())))
    }

    /// Creates an empty catalog with the given identity.
    #[must_use]
    pub fn with_identity(identity: CatalogIdentity) -> Self {
        Self {
            identity,
            state: Arc::new(RwLock::new(InMemoryCatalogState::default())),
        }
    }

    /// Returns every stored entity in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Persistence`] when the state lock is poisoned.
    pub fn snapshot(&self) -> CatalogResult<Vec<StoredEntity>> {
        let state = self.state.read().map_err(|err| {
            CatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.entities.get(id))
            .cloned()
            .collect())
    }
}

impl Default for InMemoryEntityCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityCatalog for InMemoryEntityCatalog {
    fn identity(&self) -> CatalogIdentity {
        self.identity.clone()
    }

    async fn find(&self, key: &EntityKey) -> CatalogResult<Option<StoredEntity>> {
        let state = self.state.read().map_err(|err| {
            CatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .key_index
            .get(key)
            .and_then(|id| state.entities.get(id))
            .cloned())
    }

    async fn list(&self, entity_type: EntityType) -> CatalogResult<Vec<StoredEntity>> {
        let state = self.state.read().map_err(|err| {
            CatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.entities.get(id))
            .filter(|entity| entity.record().entity_type() == entity_type)
            .cloned()
            .collect())
    }

    async fn insert(&self, entity: &StoredEntity) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(|err| {
            CatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;

        if state.entities.contains_key(&entity.id()) {
            return Err(CatalogError::DuplicateEntity(entity.id()));
        }

        let key = entity.key();
        if state.key_index.contains_key(&key) {
            return Err(CatalogError::DuplicateName(key));
        }

        state.key_index.insert(key, entity.id());
        state.order.push(entity.id());
        state.entities.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &StoredEntity) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(|err| {
            CatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let stored_key = state
            .entities
            .get(&entity.id())
            .ok_or(CatalogError::NotFound(entity.id()))?
            .key();

        let key = entity.key();
        if key != stored_key {
            if let Some(&indexed_id) = state.key_index.get(&key)
                && indexed_id != entity.id()
            {
                return Err(CatalogError::DuplicateName(key));
            }

            state.key_index.remove(&stored_key);
            state.key_index.insert(key, entity.id());
        }

        state.entities.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn delete(&self, entity_id: EntityId) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(|err| {
            CatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let removed = state
            .entities
            .remove(&entity_id)
            .ok_or(CatalogError::NotFound(entity_id))?;
        state.key_index.remove(&removed.key());
        state.order.retain(|id| *id != entity_id);
        Ok(())
    }
}
