//! Terminal result record of an import run.

use super::ImportId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// Every considered entity was reconciled without error.
    Completed,
    /// The run finished but at least one entity failed.
    CompletedWithErrors,
    /// The run aborted under the `fail` strategy and was rolled back.
    Failed,
    /// The run was a dry run; nothing was committed.
    Validated,
}

impl ImportStatus {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
            Self::Validated => "validated",
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Per-run entity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProgress {
    /// Entities surviving the selection, fixed before processing.
    pub total: usize,
    /// Entities processed so far.
    pub processed: usize,
    /// Entities created, including renamed copies.
    pub created: usize,
    /// Existing entities overwritten.
    pub updated: usize,
    /// Conflicting entities left untouched.
    pub skipped: usize,
    /// Entities that failed validation or persistence.
    pub failed: usize,
}

impl ImportProgress {
    /// Returns whether `processed` equals the sum of the outcome counters.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.processed == self.created + self.updated + self.skipped + self.failed
    }
}

/// Result record returned by one import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    status: ImportStatus,
    progress: ImportProgress,
    warnings: Vec<String>,
    errors: Vec<String>,
    import_id: ImportId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

/// Parameter object for assembling a result record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportResultParts {
    pub status: ImportStatus,
    pub progress: ImportProgress,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub import_id: ImportId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ImportResult {
    pub(crate) fn from_parts(parts: ImportResultParts) -> Self {
        Self {
            status: parts.status,
            progress: parts.progress,
            warnings: parts.warnings,
            errors: parts.errors,
            import_id: parts.import_id,
            started_at: parts.started_at,
            completed_at: parts.completed_at,
        }
    }

    /// Returns the terminal status.
    #[must_use]
    pub const fn status(&self) -> ImportStatus {
        self.status
    }

    /// Returns the counters.
    #[must_use]
    pub const fn progress(&self) -> &ImportProgress {
        &self.progress
    }

    /// Returns warnings in emission order.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns errors in emission order.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn import_id(&self) -> ImportId {
        self.import_id
    }

    /// Returns when the run started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns when the run finished.
    #[must_use]
    pub const fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Renders a human-readable summary.
    ///
    /// At most `limit` warnings and `limit` errors are listed; the remainder
    /// is collapsed into a single "... and N more" line. The record itself is
    /// never truncated.
    #[must_use]
    pub fn summary_lines(&self, limit: usize) -> Vec<String> {
        let progress = &self.progress;
        let mut lines = vec![
            format!("Import {}: {}", self.import_id, self.status),
            format!("Total entities: {}", progress.total),
            format!("Processed: {}", progress.processed),
            format!("Created: {}", progress.created),
            format!("Updated: {}", progress.updated),
            format!("Skipped: {}", progress.skipped),
            format!("Failed: {}", progress.failed),
        ];
        append_capped(&mut lines, "Warnings", &self.warnings, limit);
        append_capped(&mut lines, "Errors", &self.errors, limit);
        lines
    }
}

fn append_capped(lines: &mut Vec<String>, heading: &str, entries: &[String], limit: usize) {
    if entries.is_empty() {
        return;
    }
    lines.push(format!("{heading} ({}):", entries.len()));
    lines.extend(entries.iter().take(limit).map(|entry| format!("  - {entry}")));
    let hidden = entries.len().saturating_sub(limit);
    if hidden > 0 {
        lines.push(format!(
            "  - ... and {hidden} more {}",
            heading.to_ascii_lowercase()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(warnings: usize, errors: usize) -> ImportResult {
        let now = Utc::now();
        ImportResult::from_parts(ImportResultParts {
            status: ImportStatus::CompletedWithErrors,
            progress: ImportProgress {
                total: 3,
                processed: 3,
                created: 1,
                updated: 0,
                skipped: 0,
                failed: 2,
            },
            warnings: (0..warnings).map(|index| format!("warning {index}")).collect(),
            errors: (0..errors).map(|index| format!("error {index}")).collect(),
            import_id: ImportId::new(),
            started_at: now,
            completed_at: now,
        })
    }

    #[test]
    fn summary_caps_listed_entries_but_not_the_record() {
        let result = result_with(7, 1);
        let lines = result.summary_lines(5);

        assert!(lines.contains(&"Warnings (7):".to_owned()));
        assert!(lines.contains(&"  - ... and 2 more warnings".to_owned()));
        assert!(lines.contains(&"  - error 0".to_owned()));
        assert_eq!(result.warnings().len(), 7);
    }

    #[test]
    fn summary_omits_empty_sections() {
        let lines = result_with(0, 0).summary_lines(5);
        assert!(!lines.iter().any(|line| line.starts_with("Warnings")));
        assert!(!lines.iter().any(|line| line.starts_with("Errors")));
    }

    #[test]
    fn status_serialises_in_snake_case() {
        let value = serde_json::to_value(ImportStatus::CompletedWithErrors).expect("serialises");
        assert_eq!(value, serde_json::json!("completed_with_errors"));
    }
}
