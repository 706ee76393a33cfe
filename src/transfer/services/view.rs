//! Transactional view over a catalog for a single import run.

use crate::transfer::{
    domain::{EntityKey, StoredEntity},
    ports::{CatalogResult, EntityCatalog},
};
use std::collections::HashMap;

/// A write applied during the run, kept so it can be reverted.
#[derive(Debug, Clone, PartialEq)]
enum UndoEntry {
    Created(StoredEntity),
    Updated(StoredEntity),
}

/// Catalog access for one import run.
///
/// Committing runs write through to the catalog and log each write. Dry runs
/// write only to an in-memory overlay that later lookups in the same run
/// observe.
pub(crate) struct CatalogView<'catalog, C: EntityCatalog + ?Sized> {
    catalog: &'catalog C,
    dry_run: bool,
    overlay: HashMap<EntityKey, StoredEntity>,
    undo_log: Vec<UndoEntry>,
}

impl<'catalog, C: EntityCatalog + ?Sized> CatalogView<'catalog, C> {
    pub(crate) fn new(catalog: &'catalog C, dry_run: bool) -> Self {
        Self {
            catalog,
            dry_run,
            overlay: HashMap::new(),
            undo_log: Vec::new(),
        }
    }

    pub(crate) async fn find(&self, key: &EntityKey) -> CatalogResult<Option<StoredEntity>> {
        if let Some(simulated) = self.overlay.get(key) {
            return Ok(Some(simulated.clone()));
        }
        self.catalog.find(key).await
    }

    pub(crate) async fn exists(&self, key: &EntityKey) -> CatalogResult<bool> {
        if self.overlay.contains_key(key) {
            return Ok(true);
        }
        self.catalog.exists(key).await
    }

    pub(crate) async fn create(&mut self, entity: StoredEntity) -> CatalogResult<()> {
        if self.dry_run {
            self.overlay.insert(entity.key(), entity.clone());
        } else {
            self.catalog.insert(&entity).await?;
        }
        self.undo_log.push(UndoEntry::Created(entity));
        Ok(())
    }

    pub(crate) async fn update(
        &mut self,
        previous: StoredEntity,
        entity: StoredEntity,
    ) -> CatalogResult<()> {
        if self.dry_run {
            self.overlay.insert(entity.key(), entity);
        } else {
            self.catalog.update(&entity).await?;
        }
        self.undo_log.push(UndoEntry::Updated(previous));
        Ok(())
    }

    /// Reverts every logged write, newest first, and returns how many were
    /// reverted.
    pub(crate) async fn rollback(&mut self) -> CatalogResult<usize> {
        let reverted = self.undo_log.len();
        if self.dry_run {
            self.overlay.clear();
            self.undo_log.clear();
            return Ok(reverted);
        }

        while let Some(entry) = self.undo_log.pop() {
            match entry {
                UndoEntry::Created(entity) => self.catalog.delete(entity.id()).await?,
                UndoEntry::Updated(previous) => self.catalog.update(&previous).await?,
            }
        }
        Ok(reverted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{
        adapters::memory::InMemoryEntityCatalog,
        domain::{EntityRecord, EntityType},
    };
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn catalog() -> InMemoryEntityCatalog {
        InMemoryEntityCatalog::new()
    }

    fn server(port: u16) -> EntityRecord {
        EntityRecord::new(EntityType::Server, "prod-server").with_field("port", json!(port))
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn dry_run_writes_are_visible_only_through_the_view(catalog: InMemoryEntityCatalog) {
        let mut view = CatalogView::new(&catalog, true);
        let entity = StoredEntity::new(server(80), &DefaultClock);

        view.create(entity.clone()).await.expect("create succeeds");

        assert!(view.exists(&entity.key()).await.expect("lookup succeeds"));
        assert!(!catalog.exists(&entity.key()).await.expect("lookup succeeds"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn rollback_restores_updates_and_removes_creations(catalog: InMemoryEntityCatalog) {
        let original = StoredEntity::new(server(80), &DefaultClock);
        catalog.insert(&original).await.expect("seed succeeds");
        let mut view = CatalogView::new(&catalog, false);

        let overwritten = original.overwritten_with(server(443), &DefaultClock);
        view.update(original.clone(), overwritten)
            .await
            .expect("update succeeds");
        let created = StoredEntity::new(EntityRecord::new(EntityType::Tool, "alpha"), &DefaultClock);
        view.create(created.clone()).await.expect("create succeeds");

        let reverted = view.rollback().await.expect("rollback succeeds");

        assert_eq!(reverted, 2);
        assert_eq!(
            catalog.find(&original.key()).await.expect("lookup succeeds"),
            Some(original)
        );
        assert!(!catalog.exists(&created.key()).await.expect("lookup succeeds"));
    }
}
