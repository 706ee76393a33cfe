//! Progress counters, diagnostics and terminal status for an import run.

use crate::transfer::domain::{
    ImportId, ImportProgress, ImportResult, ImportResultParts, ImportStatus,
};
use chrono::{DateTime, Utc};
use mockable::Clock;

/// Accumulates per-entity outcomes into an [`ImportResult`].
#[derive(Debug, Clone)]
pub(crate) struct ProgressAggregator {
    import_id: ImportId,
    started_at: DateTime<Utc>,
    dry_run: bool,
    aborted: bool,
    progress: ImportProgress,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ProgressAggregator {
    /// Starts a run; `total` is fixed for its lifetime.
    pub(crate) fn start(total: usize, dry_run: bool, clock: &impl Clock) -> Self {
        Self {
            import_id: ImportId::new(),
            started_at: clock.utc(),
            dry_run,
            aborted: false,
            progress: ImportProgress {
                total,
                ..ImportProgress::default()
            },
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) const fn import_id(&self) -> ImportId {
        self.import_id
    }

    pub(crate) const fn progress(&self) -> &ImportProgress {
        &self.progress
    }

    pub(crate) const fn record_created(&mut self) {
        self.progress.processed += 1;
        self.progress.created += 1;
    }

    pub(crate) const fn record_updated(&mut self) {
        self.progress.processed += 1;
        self.progress.updated += 1;
    }

    pub(crate) const fn record_skipped(&mut self) {
        self.progress.processed += 1;
        self.progress.skipped += 1;
    }

    pub(crate) fn record_failed(&mut self, error: String) {
        self.progress.processed += 1;
        self.progress.failed += 1;
        self.errors.push(error);
    }

    pub(crate) fn warn(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub(crate) fn warn_all(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }

    pub(crate) fn error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub(crate) const fn mark_aborted(&mut self) {
        self.aborted = true;
    }

    pub(crate) const fn status(&self) -> ImportStatus {
        if self.dry_run {
            ImportStatus::Validated
        } else if self.aborted {
            ImportStatus::Failed
        } else if self.progress.failed > 0 {
            ImportStatus::CompletedWithErrors
        } else {
            ImportStatus::Completed
        }
    }

    pub(crate) fn finish(self, clock: &impl Clock) -> ImportResult {
        let status = self.status();
        ImportResult::from_parts(ImportResultParts {
            status,
            progress: self.progress,
            warnings: self.warnings,
            errors: self.errors,
            import_id: self.import_id,
            started_at: self.started_at,
            completed_at: clock.utc(),
        })
    }
}
