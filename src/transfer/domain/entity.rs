//! Entity kinds, identity keys and configuration records.

use super::{ParseEntityTypeError, TransferDomainError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Maximum length for an entity name, matching `VARCHAR(255)`.
pub const MAX_ENTITY_NAME_LENGTH: usize = 255;

/// Closed set of configuration entity kinds held by a gateway.
///
/// The wire form is the plural key used in export payloads (`tools`,
/// `gateways`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    /// A registered tool.
    #[serde(rename = "tools")]
    Tool,
    /// An upstream federated gateway.
    #[serde(rename = "gateways")]
    Gateway,
    /// A virtual server bundling tools, prompts and resources.
    #[serde(rename = "servers")]
    Server,
    /// A prompt template.
    #[serde(rename = "prompts")]
    Prompt,
    /// A resource definition.
    #[serde(rename = "resources")]
    Resource,
    /// A filesystem or URI root.
    #[serde(rename = "roots")]
    Root,
}

impl EntityType {
    /// Every entity type, in export listing order.
    pub const ALL: [Self; 6] = [
        Self::Tool,
        Self::Gateway,
        Self::Server,
        Self::Prompt,
        Self::Resource,
        Self::Root,
    ];

    /// Returns the canonical plural representation used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tools",
            Self::Gateway => "gateways",
            Self::Server => "servers",
            Self::Prompt => "prompts",
            Self::Resource => "resources",
            Self::Root => "roots",
        }
    }

    /// Returns the singular form used in messages.
    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Gateway => "gateway",
            Self::Server => "server",
            Self::Prompt => "prompt",
            Self::Resource => "resource",
            Self::Root => "root",
        }
    }

    /// Returns the base import rank; lower ranks are reconciled first.
    ///
    /// Upstream gateways and roots carry no references, virtual servers come
    /// next, and leaf definitions follow. Intra-payload dependency edges may
    /// still pull a record ahead of its base rank.
    #[must_use]
    pub const fn import_rank(self) -> u8 {
        match self {
            Self::Gateway | Self::Root => 0,
            Self::Server => 1,
            Self::Tool | Self::Prompt | Self::Resource => 2,
        }
    }

    /// Returns all entity types sorted by import rank, ties in listing order.
    #[must_use]
    pub fn in_import_order() -> Vec<Self> {
        let mut ordered = Self::ALL.to_vec();
        ordered.sort_by_key(|entity_type| entity_type.import_rank());
        ordered
    }

    /// Parses a comma-separated list of entity types.
    ///
    /// Blank segments are ignored, so `"tools,,servers"` yields two types.
    ///
    /// # Errors
    ///
    /// Returns [`ParseEntityTypeError`] for the first unknown type.
    pub fn parse_list(value: &str) -> Result<BTreeSet<Self>, ParseEntityTypeError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(Self::try_from)
            .collect()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EntityType {
    type Error = ParseEntityTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "tool" | "tools" => Ok(Self::Tool),
            "gateway" | "gateways" => Ok(Self::Gateway),
            "server" | "servers" => Ok(Self::Server),
            "prompt" | "prompts" => Ok(Self::Prompt),
            "resource" | "resources" => Ok(Self::Resource),
            "root" | "roots" => Ok(Self::Root),
            _ => Err(ParseEntityTypeError(value.to_owned())),
        }
    }
}

/// Identity of an entity: names are unique within a type only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    /// Entity kind.
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Entity name, unique within the kind.
    pub name: String,
}

impl EntityKey {
    /// Creates an entity key.
    #[must_use]
    pub fn new(entity_type: EntityType, name: impl Into<String>) -> Self {
        Self {
            entity_type,
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} '{}'", self.entity_type.singular(), self.name)
    }
}

/// A single exported configuration object.
///
/// `fields` is opaque to the engine apart from the entries named in
/// `secret_fields`, which hold ciphertext strings encrypted at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(rename = "type")]
    entity_type: EntityType,
    name: String,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    dependencies: BTreeSet<EntityKey>,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default)]
    secret_fields: BTreeSet<String>,
}

const fn default_active() -> bool {
    true
}

impl EntityRecord {
    /// Creates an active record with no tags, dependencies or fields.
    #[must_use]
    pub fn new(entity_type: EntityType, name: impl Into<String>) -> Self {
        Self {
            entity_type,
            name: name.into(),
            tags: BTreeSet::new(),
            active: true,
            dependencies: BTreeSet::new(),
            fields: Map::new(),
            secret_fields: BTreeSet::new(),
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Sets whether the record is active.
    #[must_use]
    pub const fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Adds a dependency on another entity.
    #[must_use]
    pub fn with_dependency(mut self, entity_type: EntityType, name: impl Into<String>) -> Self {
        self.dependencies.insert(EntityKey::new(entity_type, name));
        self
    }

    /// Sets an opaque attribute.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Sets an attribute holding ciphertext and marks it as secret.
    #[must_use]
    pub fn with_secret_field(mut self, field: impl Into<String>, ciphertext: impl Into<String>) -> Self {
        let field_name = field.into();
        self.fields
            .insert(field_name.clone(), Value::String(ciphertext.into()));
        self.secret_fields.insert(field_name);
        self
    }

    /// Returns the entity kind.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns the entity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the identity key.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.entity_type, self.name.clone())
    }

    /// Returns the tag set.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns whether the record is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the entities this record references.
    #[must_use]
    pub const fn dependencies(&self) -> &BTreeSet<EntityKey> {
        &self.dependencies
    }

    /// Returns the opaque attribute map.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the names of fields encrypted at rest.
    #[must_use]
    pub const fn secret_fields(&self) -> &BTreeSet<String> {
        &self.secret_fields
    }

    /// Returns the string value of a secret field, if present.
    #[must_use]
    pub fn secret_value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Returns whether any requested tag is carried by this record.
    ///
    /// An empty request matches every record.
    #[must_use]
    pub fn matches_any_tag(&self, requested: &BTreeSet<String>) -> bool {
        requested.is_empty() || !self.tags.is_disjoint(requested)
    }

    /// Returns a copy of this record under a different name.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the ciphertext of a secret field.
    pub(crate) fn replace_secret(&mut self, field: &str, ciphertext: String) {
        if self.secret_fields.contains(field) {
            self.fields.insert(field.to_owned(), Value::String(ciphertext));
        }
    }

    /// Validates the record's name and secret field declarations.
    ///
    /// # Errors
    ///
    /// Returns [`TransferDomainError`] when the name is blank or too long, or
    /// when a declared secret field is missing or not a string.
    pub fn validate(&self) -> Result<(), TransferDomainError> {
        if self.name.trim().is_empty() {
            return Err(TransferDomainError::EmptyEntityName(self.entity_type));
        }
        if self.name.chars().count() > MAX_ENTITY_NAME_LENGTH {
            return Err(TransferDomainError::EntityNameTooLong(self.key()));
        }

        for field in &self.secret_fields {
            match self.fields.get(field) {
                None => {
                    return Err(TransferDomainError::MissingSecretField {
                        key: self.key(),
                        field: field.clone(),
                    });
                }
                Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(TransferDomainError::NonStringSecretField {
                        key: self.key(),
                        field: field.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
