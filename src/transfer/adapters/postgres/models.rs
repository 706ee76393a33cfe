//! Diesel row models for catalog entity persistence.

use super::schema::catalog_entities;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for catalog entities.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = catalog_entities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CatalogEntityRow {
    /// Catalog-assigned entity identifier.
    pub id: uuid::Uuid,
    /// Plural entity type key.
    pub entity_type: String,
    /// Entity name.
    pub name: String,
    /// Tag set.
    pub tags: Value,
    /// Activity flag.
    pub active: bool,
    /// Referenced entities.
    pub dependencies: Value,
    /// Opaque attributes.
    pub fields: Value,
    /// Names of secret attributes.
    pub secret_fields: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for catalog entities.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = catalog_entities)]
pub struct NewCatalogEntityRow {
    /// Catalog-assigned entity identifier.
    pub id: uuid::Uuid,
    /// Plural entity type key.
    pub entity_type: String,
    /// Entity name.
    pub name: String,
    /// Tag set.
    pub tags: Value,
    /// Activity flag.
    pub active: bool,
    /// Referenced entities.
    pub dependencies: Value,
    /// Opaque attributes.
    pub fields: Value,
    /// Names of secret attributes.
    pub secret_fields: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
