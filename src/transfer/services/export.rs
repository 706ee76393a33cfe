//! Export selection: type, tag and activity filters plus dependency closure.

use crate::transfer::{
    domain::{EntityKey, EntityRecord, EntityType, ParseEntityTypeError},
    ports::CatalogError,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Errors raised by export operations.
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    /// The filter excludes every entity type it names.
    #[error("invalid export filter: {0}")]
    InvalidFilter(String),
    /// A type list named an unknown entity type.
    #[error(transparent)]
    UnknownType(#[from] ParseEntityTypeError),
    /// The catalog could not be read.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Which stored entities an export includes.
///
/// The default filter exports every active entity of every type, closed over
/// dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFilter {
    include_types: Option<BTreeSet<EntityType>>,
    exclude_types: BTreeSet<EntityType>,
    tags: BTreeSet<String>,
    include_inactive: bool,
    include_dependencies: bool,
}

impl Default for ExportFilter {
    fn default() -> Self {
        Self {
            include_types: None,
            exclude_types: BTreeSet::new(),
            tags: BTreeSet::new(),
            include_inactive: false,
            include_dependencies: true,
        }
    }
}

impl ExportFilter {
    /// Creates the default filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the export to the given types.
    #[must_use]
    pub fn with_types(mut self, types: impl IntoIterator<Item = EntityType>) -> Self {
        self.include_types
            .get_or_insert_with(BTreeSet::new)
            .extend(types);
        self
    }

    /// Removes the given types from the export.
    #[must_use]
    pub fn excluding_types(mut self, types: impl IntoIterator<Item = EntityType>) -> Self {
        self.exclude_types.extend(types);
        self
    }

    /// Keeps only records carrying at least one of the given tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Includes inactive records in the seed set.
    #[must_use]
    pub const fn including_inactive(mut self, include_inactive: bool) -> Self {
        self.include_inactive = include_inactive;
        self
    }

    /// Enables or disables dependency closure.
    #[must_use]
    pub const fn including_dependencies(mut self, include_dependencies: bool) -> Self {
        self.include_dependencies = include_dependencies;
        self
    }

    /// Builds a filter from raw request parameters.
    ///
    /// `types` and `exclude_types` are comma-separated type lists and `tags`
    /// is a comma-separated tag list. Blank or absent values apply no
    /// restriction.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnknownType`] when a type list names an unknown
    /// type.
    pub fn from_params(
        types: Option<&str>,
        exclude_types: Option<&str>,
        tags: Option<&str>,
        include_inactive: bool,
        include_dependencies: bool,
    ) -> Result<Self, ExportError> {
        let mut filter = Self::new()
            .including_inactive(include_inactive)
            .including_dependencies(include_dependencies);

        if let Some(raw) = types.filter(|value| !value.trim().is_empty()) {
            filter = filter.with_types(EntityType::parse_list(raw)?);
        }
        if let Some(raw) = exclude_types {
            filter = filter.excluding_types(EntityType::parse_list(raw)?);
        }
        if let Some(raw) = tags {
            filter = filter.with_tags(
                raw.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty()),
            );
        }
        Ok(filter)
    }

    /// Returns whether dependency closure is enabled.
    #[must_use]
    pub const fn includes_dependencies(&self) -> bool {
        self.include_dependencies
    }

    /// Resolves the effective set of exported types.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidFilter`] when the request names types but
    /// the inclusion and exclusion lists leave none.
    pub fn resolved_types(&self) -> Result<BTreeSet<EntityType>, ExportError> {
        let base = self
            .include_types
            .clone()
            .unwrap_or_else(|| EntityType::ALL.into_iter().collect());
        let resolved: BTreeSet<EntityType> =
            base.difference(&self.exclude_types).copied().collect();

        let named_types = self.include_types.is_some() || !self.exclude_types.is_empty();
        if resolved.is_empty() && named_types {
            return Err(ExportError::InvalidFilter(
                "the requested type lists leave no entity types to export".to_owned(),
            ));
        }
        Ok(resolved)
    }

    /// Selects records from a full catalog listing.
    ///
    /// `catalog` holds every stored record keyed by type, each list in the
    /// catalog's enumeration order. The result holds every type with the
    /// selected records in that same order.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidFilter`] as for [`Self::resolved_types`].
    pub fn select(
        &self,
        catalog: &BTreeMap<EntityType, Vec<EntityRecord>>,
    ) -> Result<BTreeMap<EntityType, Vec<EntityRecord>>, ExportError> {
        let types = self.resolved_types()?;

        let mut selected: HashSet<EntityKey> = HashSet::new();
        let mut frontier: VecDeque<EntityKey> = VecDeque::new();
        let seeds = types
            .iter()
            .filter_map(|entity_type| catalog.get(entity_type))
            .flatten()
            .filter(|record| record.matches_any_tag(&self.tags))
            .filter(|record| self.include_inactive || record.is_active());
        for record in seeds {
            let key = record.key();
            if selected.insert(key.clone()) {
                frontier.push_back(key);
            }
        }

        if self.include_dependencies {
            close_over_dependencies(catalog, &mut selected, frontier);
        }

        Ok(catalog
            .iter()
            .map(|(entity_type, records)| {
                let kept = records
                    .iter()
                    .filter(|record| selected.contains(&record.key()))
                    .cloned()
                    .collect();
                (*entity_type, kept)
            })
            .collect())
    }
}

/// Breadth-first closure over dependency edges.
///
/// Dependencies are added regardless of the seed filters. References to
/// records absent from the catalog are left dangling.
fn close_over_dependencies(
    catalog: &BTreeMap<EntityType, Vec<EntityRecord>>,
    selected: &mut HashSet<EntityKey>,
    mut frontier: VecDeque<EntityKey>,
) {
    let index: HashMap<EntityKey, &EntityRecord> = catalog
        .values()
        .flatten()
        .map(|record| (record.key(), record))
        .collect();

    while let Some(key) = frontier.pop_front() {
        let Some(record) = index.get(&key) else {
            continue;
        };
        for dependency in record.dependencies() {
            if index.contains_key(dependency) && selected.insert(dependency.clone()) {
                frontier.push_back(dependency.clone());
            }
        }
    }
}
