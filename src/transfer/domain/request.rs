//! Import request, conflict strategy and selective-import allow-list.

use super::{
    EntityKey, EntityType, ExportPayload, ParseConflictStrategyError, TransferDomainError,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// How an import handles a name already present in the target catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Leave the existing record untouched.
    Skip,
    /// Overwrite the existing record's mutable fields.
    #[default]
    Update,
    /// Create the incoming record under the first free suffixed name.
    Rename,
    /// Abort the run and roll back everything it committed.
    Fail,
}

impl ConflictStrategy {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Update => "update",
            Self::Rename => "rename",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ConflictStrategy {
    type Error = ParseConflictStrategyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "skip" => Ok(Self::Skip),
            "update" => Ok(Self::Update),
            "rename" => Ok(Self::Rename),
            "fail" => Ok(Self::Fail),
            _ => Err(ParseConflictStrategyError(value.to_owned())),
        }
    }
}

/// How a selection treats entity types it does not mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmentionedTypePolicy {
    /// Unmentioned types are imported unrestricted.
    #[default]
    Allow,
    /// Unmentioned types are excluded.
    Deny,
}

/// Import-time allow-list of entity names keyed by type.
///
/// A mentioned type admits only its listed names; an empty name set admits
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    types: BTreeMap<EntityType, BTreeSet<String>>,
}

impl Selection {
    /// Creates an empty selection that mentions no types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows the given names for a type, adding to any already allowed.
    #[must_use]
    pub fn with<I, S>(mut self, entity_type: EntityType, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types
            .entry(entity_type)
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Parses the selective-import syntax `type:name1,name2;type2:name3`.
    ///
    /// Names and types are trimmed, blank names are dropped, and segments
    /// without a `:` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TransferDomainError::InvalidSelection`] for an unknown type.
    pub fn parse(value: &str) -> Result<Self, TransferDomainError> {
        let mut selection = Self::new();
        for segment in value.split(';') {
            let Some((type_part, names_part)) = segment.split_once(':') else {
                continue;
            };
            let entity_type = EntityType::try_from(type_part)?;
            let names = names_part
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty());
            selection = selection.with(entity_type, names);
        }
        Ok(selection)
    }

    /// Returns whether the selection mentions a type.
    #[must_use]
    pub fn mentions(&self, entity_type: EntityType) -> bool {
        self.types.contains_key(&entity_type)
    }

    /// Returns whether the entity passes the allow-list.
    #[must_use]
    pub fn allows(&self, key: &EntityKey, unmentioned: UnmentionedTypePolicy) -> bool {
        self.types.get(&key.entity_type).map_or(
            matches!(unmentioned, UnmentionedTypePolicy::Allow),
            |names| names.contains(&key.name),
        )
    }
}

/// Parameters for one import run.
#[derive(Clone, PartialEq)]
pub struct ImportRequest {
    /// Payload to reconcile.
    pub payload: ExportPayload,
    /// Conflict handling policy.
    pub conflict_strategy: ConflictStrategy,
    /// Whether to simulate without committing.
    pub dry_run: bool,
    /// Secret from which the target encryption key is derived.
    pub rekey_secret: Option<String>,
    /// Optional allow-list restricting which entities are considered.
    pub selection: Option<Selection>,
}

impl ImportRequest {
    /// Creates a committing request with the default `update` strategy.
    #[must_use]
    pub fn new(payload: ExportPayload) -> Self {
        Self {
            payload,
            conflict_strategy: ConflictStrategy::default(),
            dry_run: false,
            rekey_secret: None,
            selection: None,
        }
    }

    /// Sets the conflict strategy.
    #[must_use]
    pub const fn with_conflict_strategy(mut self, conflict_strategy: ConflictStrategy) -> Self {
        self.conflict_strategy = conflict_strategy;
        self
    }

    /// Turns the request into a dry run.
    #[must_use]
    pub const fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Sets the rekey secret.
    #[must_use]
    pub fn with_rekey_secret(mut self, secret: impl Into<String>) -> Self {
        self.rekey_secret = Some(secret.into());
        self
    }

    /// Sets the selection allow-list.
    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }
}

impl fmt::Debug for ImportRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImportRequest")
            .field("payload_total", &self.payload.total())
            .field("conflict_strategy", &self.conflict_strategy)
            .field("dry_run", &self.dry_run)
            .field(
                "rekey_secret",
                &self.rekey_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("selection", &self.selection)
            .finish()
    }
}
