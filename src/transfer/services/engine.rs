//! Export and import orchestration over a catalog.

use super::{
    export::{ExportError, ExportFilter},
    import::{ImportError, ImportRun, ImportRunContext},
    locks::{CatalogLocks, LockMode},
    ordering::processing_plan,
};
use crate::config::TransferConfig;
use crate::transfer::{
    domain::{
        EntityRecord, EntityType, ExportPayload, ImportRequest, ImportResult, PayloadHeader,
        StoredEntity,
    },
    ports::EntityCatalog,
    secrets::{KeyRing, SecretRekeyer},
};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Exports catalog contents and reconciles payloads into the catalog.
///
/// Exports and dry runs hold a shared lock on the catalog for their whole
/// duration; committing imports hold an exclusive one.
#[derive(Clone)]
pub struct TransferEngine<C, K>
where
    C: EntityCatalog,
    K: Clock + Send + Sync,
{
    catalog: Arc<C>,
    clock: Arc<K>,
    keys: Arc<KeyRing>,
    locks: CatalogLocks,
    config: TransferConfig,
}

impl<C, K> TransferEngine<C, K>
where
    C: EntityCatalog,
    K: Clock + Send + Sync,
{
    /// Creates an engine with its own lock registry.
    #[must_use]
    pub fn new(catalog: Arc<C>, clock: Arc<K>, keys: Arc<KeyRing>, config: TransferConfig) -> Self {
        Self {
            catalog,
            clock,
            keys,
            locks: CatalogLocks::new(),
            config,
        }
    }

    /// Shares a lock registry with other engines over the same catalogs.
    #[must_use]
    pub fn with_locks(mut self, locks: CatalogLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Returns the lock registry.
    #[must_use]
    pub const fn locks(&self) -> &CatalogLocks {
        &self.locks
    }

    /// Exports the entities selected by `filter`, attributed to the
    /// configured principal.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] when the filter is invalid or the catalog
    /// cannot be read.
    pub async fn export(&self, filter: &ExportFilter) -> Result<ExportPayload, ExportError> {
        self.export_as(filter, self.config.exported_by.clone()).await
    }

    /// Exports the entities selected by `filter`, attributed to
    /// `exported_by`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] when the filter is invalid or the catalog
    /// cannot be read.
    pub async fn export_as(
        &self,
        filter: &ExportFilter,
        exported_by: impl Into<String> + Send,
    ) -> Result<ExportPayload, ExportError> {
        filter.resolved_types()?;
        let identity = self.catalog.identity();
        let _guard = self.locks.acquire(&identity, LockMode::Shared).await;

        let mut listing: BTreeMap<EntityType, Vec<EntityRecord>> = BTreeMap::new();
        for entity_type in EntityType::ALL {
            let stored = self.catalog.list(entity_type).await?;
            listing.insert(
                entity_type,
                stored.into_iter().map(StoredEntity::into_record).collect(),
            );
        }

        let selected = filter.select(&listing)?;
        let payload = ExportPayload::new(
            PayloadHeader {
                exported_at: self.clock.utc(),
                exported_by: exported_by.into(),
                source_identity: self.config.source_identity.clone(),
                source_key_id: Some(self.keys.active().id()),
            },
            selected,
        );
        info!(
            catalog = %identity,
            total = payload.total(),
            dependencies = filter.includes_dependencies(),
            "export finished"
        );
        Ok(payload)
    }

    /// Reconciles a payload into the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnsupportedSchema`] or
    /// [`ImportError::InvalidPayload`] before anything is processed, and
    /// [`ImportError::Aborted`] when the `fail` strategy stops the run.
    pub async fn import(&self, request: ImportRequest) -> Result<ImportResult, ImportError> {
        let ImportRequest {
            payload,
            conflict_strategy,
            dry_run,
            rekey_secret,
            selection,
        } = request;

        let supported = self.config.supported_schema_version;
        if payload.schema_version() > supported {
            return Err(ImportError::UnsupportedSchema {
                found: payload.schema_version(),
                supported,
            });
        }
        payload.check_consistency()?;

        let rekeyer = SecretRekeyer::new(
            &self.keys,
            payload.source_key_id(),
            rekey_secret.as_deref(),
            &self.config.kdf,
        )?;

        let policy = self.config.unmentioned_selection_types;
        let candidates: Vec<EntityRecord> = EntityType::in_import_order()
            .into_iter()
            .flat_map(|entity_type| payload.entities(entity_type))
            .filter(|record| {
                selection
                    .as_ref()
                    .is_none_or(|allowed| allowed.allows(&record.key(), policy))
            })
            .cloned()
            .collect();
        let plan = processing_plan(candidates);

        let identity = self.catalog.identity();
        let mode = if dry_run {
            LockMode::Shared
        } else {
            LockMode::Exclusive
        };
        let _guard = self.locks.acquire(&identity, mode).await;
        info!(
            catalog = %identity,
            source = payload.source_identity(),
            total = plan.len(),
            strategy = %conflict_strategy,
            dry_run,
            "import started"
        );

        let run = ImportRun::new(
            ImportRunContext {
                catalog: &*self.catalog,
                rekeyer: &rekeyer,
                clock: &*self.clock,
                strategy: conflict_strategy,
                dry_run,
                rename_suffix_start: self.config.rename_suffix_start,
            },
            plan.len(),
        );
        run.execute(plan).await
    }
}
