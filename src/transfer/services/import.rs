//! Per-entity reconciliation for one import run.

use super::{
    aggregator::ProgressAggregator,
    ordering::PlannedEntity,
    view::CatalogView,
};
use crate::transfer::{
    domain::{
        ConflictStrategy, EntityKey, EntityRecord, ImportResult, SchemaVersion, StoredEntity,
        TransferDomainError,
    },
    ports::{CatalogError, EntityCatalog},
    secrets::{SecretError, SecretRekeyer},
};
use mockable::Clock;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that end an import run as a whole.
///
/// Per-entity problems do not surface here; they are recorded in the
/// [`ImportResult`] instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The payload was written by a newer schema than this importer supports.
    #[error("payload schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema {
        /// Version declared by the payload.
        found: SchemaVersion,
        /// Newest version this importer accepts.
        supported: SchemaVersion,
    },
    /// The payload is internally inconsistent.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] TransferDomainError),
    /// The rekey secret could not be turned into a key.
    #[error(transparent)]
    Secret(#[from] SecretError),
    /// The `fail` strategy aborted the run; every committed write was rolled
    /// back.
    #[error("import aborted with status {}", .0.status())]
    Aborted(Box<ImportResult>),
    /// The run aborted and reverting its writes failed part-way.
    #[error("import aborted and rollback failed: {source}")]
    RollbackFailed {
        /// Catalog failure raised while reverting.
        source: CatalogError,
        /// Result describing the run up to the failure.
        result: Box<ImportResult>,
    },
}

impl ImportError {
    /// Returns the terminal result carried by an aborted run.
    #[must_use]
    pub fn result(&self) -> Option<&ImportResult> {
        match self {
            Self::Aborted(result) | Self::RollbackFailed { result, .. } => Some(result),
            Self::UnsupportedSchema { .. } | Self::InvalidPayload(_) | Self::Secret(_) => None,
        }
    }
}

/// What happened to one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Created,
    Renamed(String),
    Updated,
    Skipped,
}

/// Why one entity could not be reconciled.
#[derive(Debug)]
enum EntityFailure {
    Conflict(EntityKey),
    Invalid(TransferDomainError),
    Catalog { key: EntityKey, source: CatalogError },
}

impl EntityFailure {
    fn catalog(key: &EntityKey) -> impl FnOnce(CatalogError) -> Self + '_ {
        move |source| Self::Catalog {
            key: key.clone(),
            source,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Conflict(key) => {
                format!("{key} already exists and the conflict strategy is 'fail'")
            }
            Self::Invalid(err) => err.to_string(),
            Self::Catalog { key, source } => format!("failed to store {key}: {source}"),
        }
    }
}

/// State of one import run between planning and the terminal result.
pub(crate) struct ImportRun<'run, C, K>
where
    C: EntityCatalog + ?Sized,
    K: Clock,
{
    view: CatalogView<'run, C>,
    progress: ProgressAggregator,
    rekeyer: &'run SecretRekeyer,
    clock: &'run K,
    strategy: ConflictStrategy,
    rename_suffix_start: u32,
}

/// Collaborators and policy for an [`ImportRun`].
pub(crate) struct ImportRunContext<'run, C: ?Sized, K> {
    pub catalog: &'run C,
    pub rekeyer: &'run SecretRekeyer,
    pub clock: &'run K,
    pub strategy: ConflictStrategy,
    pub dry_run: bool,
    pub rename_suffix_start: u32,
}

impl<'run, C, K> ImportRun<'run, C, K>
where
    C: EntityCatalog + ?Sized,
    K: Clock + Send + Sync,
{
    pub(crate) fn new(context: ImportRunContext<'run, C, K>, total: usize) -> Self {
        Self {
            view: CatalogView::new(context.catalog, context.dry_run),
            progress: ProgressAggregator::start(total, context.dry_run, context.clock),
            rekeyer: context.rekeyer,
            clock: context.clock,
            strategy: context.strategy,
            rename_suffix_start: context.rename_suffix_start,
        }
    }

    /// Reconciles every planned entity and returns the terminal result.
    pub(crate) async fn execute(
        mut self,
        plan: Vec<PlannedEntity>,
    ) -> Result<ImportResult, ImportError> {
        for planned in plan {
            let key = planned.record.key();
            if planned.is_cyclic() {
                debug!(entity = %key, peers = ?planned.cycle_peers, "entity is on a dependency cycle");
            }
            match self.reconcile(planned).await {
                Ok(outcome) => self.record(&key, &outcome),
                Err(failure) if self.strategy == ConflictStrategy::Fail => {
                    return self.abort(&failure).await;
                }
                Err(failure) => {
                    let message = failure.describe();
                    warn!(entity = %key, error = %message, "entity not imported");
                    self.progress.record_failed(message);
                }
            }
        }

        let import_id = self.progress.import_id();
        let progress = *self.progress.progress();
        info!(
            %import_id,
            total = progress.total,
            created = progress.created,
            updated = progress.updated,
            skipped = progress.skipped,
            failed = progress.failed,
            "import finished"
        );
        Ok(self.progress.finish(self.clock))
    }

    fn record(&mut self, key: &EntityKey, outcome: &Outcome) {
        debug!(entity = %key, ?outcome, "entity reconciled");
        match outcome {
            Outcome::Created | Outcome::Renamed(_) => self.progress.record_created(),
            Outcome::Updated => self.progress.record_updated(),
            Outcome::Skipped => self.progress.record_skipped(),
        }
    }

    async fn abort(mut self, failure: &EntityFailure) -> Result<ImportResult, ImportError> {
        let message = failure.describe();
        warn!(error = %message, "aborting import and rolling back");
        self.progress.record_failed(message);
        self.progress.mark_aborted();

        match self.view.rollback().await {
            Ok(reverted) => {
                warn!(reverted, "import rolled back");
                self.progress
                    .warn(format!("rolled back {reverted} change(s) made earlier in this run"));
                Err(ImportError::Aborted(Box::new(self.progress.finish(self.clock))))
            }
            Err(source) => {
                warn!(error = %source, "rollback failed");
                self.progress.error(format!("rollback failed: {source}"));
                Err(ImportError::RollbackFailed {
                    source,
                    result: Box::new(self.progress.finish(self.clock)),
                })
            }
        }
    }

    async fn reconcile(&mut self, planned: PlannedEntity) -> Result<Outcome, EntityFailure> {
        let PlannedEntity {
            record,
            cycle_peers,
        } = planned;
        let key = record.key();
        record.validate().map_err(EntityFailure::Invalid)?;

        for dependency in record.dependencies() {
            if cycle_peers.contains(dependency) {
                continue;
            }
            let resolved = self
                .view
                .exists(dependency)
                .await
                .map_err(EntityFailure::catalog(&key))?;
            if !resolved {
                return Err(EntityFailure::Invalid(
                    TransferDomainError::UnresolvedDependency {
                        key,
                        dependency: dependency.clone(),
                    },
                ));
            }
        }

        let existing = self
            .view
            .find(&key)
            .await
            .map_err(EntityFailure::catalog(&key))?;
        let Some(current) = existing else {
            self.create(record).await?;
            return Ok(Outcome::Created);
        };

        match self.strategy {
            ConflictStrategy::Skip => Ok(Outcome::Skipped),
            ConflictStrategy::Update => {
                let incoming = self.rekey(record);
                let overwritten = current.overwritten_with(incoming, self.clock);
                self.view
                    .update(current, overwritten)
                    .await
                    .map_err(EntityFailure::catalog(&key))?;
                Ok(Outcome::Updated)
            }
            ConflictStrategy::Rename => {
                let free_name = self.free_name(&key).await?;
                let renamed = record.renamed(free_name.clone());
                renamed.validate().map_err(EntityFailure::Invalid)?;
                self.create(renamed).await?;
                Ok(Outcome::Renamed(free_name))
            }
            ConflictStrategy::Fail => Err(EntityFailure::Conflict(key)),
        }
    }

    async fn create(&mut self, record: EntityRecord) -> Result<(), EntityFailure> {
        let key = record.key();
        let entity = StoredEntity::new(self.rekey(record), self.clock);
        self.view
            .create(entity)
            .await
            .map_err(EntityFailure::catalog(&key))
    }

    fn rekey(&mut self, record: EntityRecord) -> EntityRecord {
        let outcome = self.rekeyer.rekey(record);
        self.progress.warn_all(outcome.warnings);
        outcome.record
    }

    async fn free_name(&self, key: &EntityKey) -> Result<String, EntityFailure> {
        for suffix in self.rename_suffix_start..=u32::MAX {
            let candidate = format!("{}-{suffix}", key.name);
            let taken = self
                .view
                .exists(&EntityKey::new(key.entity_type, candidate.clone()))
                .await
                .map_err(EntityFailure::catalog(key))?;
            if !taken {
                return Ok(candidate);
            }
        }
        Err(EntityFailure::Invalid(
            TransferDomainError::RenameSuffixExhausted(key.clone()),
        ))
    }
}
