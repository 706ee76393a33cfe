//! `PostgreSQL` implementation of the entity catalog.

use super::{
    models::{CatalogEntityRow, NewCatalogEntityRow},
    schema::catalog_entities,
};
use crate::transfer::{
    domain::{EntityId, EntityKey, EntityRecord, EntityType, PersistedEntityData, StoredEntity},
    ports::{CatalogError, CatalogIdentity, CatalogResult, EntityCatalog},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::{Value, json};

/// `PostgreSQL` connection pool type for the catalog adapter.
pub type CatalogPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed entity catalog.
///
/// Entities of one type enumerate by creation time, ties broken by id.
#[derive(Debug, Clone)]
pub struct PostgresEntityCatalog {
    pool: CatalogPgPool,
    identity: CatalogIdentity,
}

impl PostgresEntityCatalog {
    /// Creates a catalog over a pool.
    ///
    /// `identity` must be the same for every handle onto one database so that
    /// committing imports serialize against each other.
    #[must_use]
    pub const fn new(pool: CatalogPgPool, identity: CatalogIdentity) -> Self {
        Self { pool, identity }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> CatalogResult<T>
    where
        F: FnOnce(&mut PgConnection) -> CatalogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(CatalogError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(CatalogError::persistence)?
    }
}

#[async_trait]
impl EntityCatalog for PostgresEntityCatalog {
    fn identity(&self) -> CatalogIdentity {
        self.identity.clone()
    }

    async fn find(&self, key: &EntityKey) -> CatalogResult<Option<StoredEntity>> {
        let entity_type = key.entity_type.as_str();
        let name = key.name.clone();
        self.run_blocking(move |connection| {
            let row = catalog_entities::table
                .filter(catalog_entities::entity_type.eq(entity_type))
                .filter(catalog_entities::name.eq(&name))
                .select(CatalogEntityRow::as_select())
                .first::<CatalogEntityRow>(connection)
                .optional()
                .map_err(CatalogError::persistence)?;
            row.map(row_to_entity).transpose()
        })
        .await
    }

    async fn list(&self, entity_type: EntityType) -> CatalogResult<Vec<StoredEntity>> {
        self.run_blocking(move |connection| {
            let rows = catalog_entities::table
                .filter(catalog_entities::entity_type.eq(entity_type.as_str()))
                .order((catalog_entities::created_at.asc(), catalog_entities::id.asc()))
                .select(CatalogEntityRow::as_select())
                .load::<CatalogEntityRow>(connection)
                .map_err(CatalogError::persistence)?;
            rows.into_iter().map(row_to_entity).collect()
        })
        .await
    }

    async fn insert(&self, entity: &StoredEntity) -> CatalogResult<()> {
        let entity_id = entity.id();
        let key = entity.key();
        let new_row = to_new_row(entity)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(catalog_entities::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_key_unique_violation(info.as_ref()) =>
                    {
                        CatalogError::DuplicateName(key.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        CatalogError::DuplicateEntity(entity_id)
                    }
                    _ => CatalogError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, entity: &StoredEntity) -> CatalogResult<()> {
        let entity_id = entity.id();
        let row = to_new_row(entity)?;

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                catalog_entities::table.filter(catalog_entities::id.eq(entity_id.into_inner())),
            )
            .set((
                catalog_entities::tags.eq(&row.tags),
                catalog_entities::active.eq(row.active),
                catalog_entities::dependencies.eq(&row.dependencies),
                catalog_entities::fields.eq(&row.fields),
                catalog_entities::secret_fields.eq(&row.secret_fields),
                catalog_entities::updated_at.eq(row.updated_at),
            ))
            .execute(connection)
            .map_err(CatalogError::persistence)?;

            if updated_count == 0 {
                return Err(CatalogError::NotFound(entity_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, entity_id: EntityId) -> CatalogResult<()> {
        self.run_blocking(move |connection| {
            let deleted_count = diesel::delete(
                catalog_entities::table.filter(catalog_entities::id.eq(entity_id.into_inner())),
            )
            .execute(connection)
            .map_err(CatalogError::persistence)?;

            if deleted_count == 0 {
                return Err(CatalogError::NotFound(entity_id));
            }
            Ok(())
        })
        .await
    }
}

fn to_new_row(entity: &StoredEntity) -> CatalogResult<NewCatalogEntityRow> {
    let record = entity.record();
    Ok(NewCatalogEntityRow {
        id: entity.id().into_inner(),
        entity_type: record.entity_type().as_str().to_owned(),
        name: record.name().to_owned(),
        tags: serde_json::to_value(record.tags()).map_err(CatalogError::persistence)?,
        active: record.is_active(),
        dependencies: serde_json::to_value(record.dependencies())
            .map_err(CatalogError::persistence)?,
        fields: Value::Object(record.fields().clone()),
        secret_fields: serde_json::to_value(record.secret_fields())
            .map_err(CatalogError::persistence)?,
        created_at: entity.created_at(),
        updated_at: entity.updated_at(),
    })
}

fn row_to_entity(row: CatalogEntityRow) -> CatalogResult<StoredEntity> {
    let CatalogEntityRow {
        id,
        entity_type,
        name,
        tags,
        active,
        dependencies,
        fields,
        secret_fields,
        created_at,
        updated_at,
    } = row;

    let parsed_type = EntityType::try_from(entity_type.as_str())
        .map_err(CatalogError::invalid_persisted_data)?;
    let record: EntityRecord = serde_json::from_value(json!({
        "type": parsed_type,
        "name": name,
        "tags": tags,
        "active": active,
        "dependencies": dependencies,
        "fields": fields,
        "secret_fields": secret_fields,
    }))
    .map_err(CatalogError::invalid_persisted_data)?;
    record
        .validate()
        .map_err(CatalogError::invalid_persisted_data)?;

    Ok(StoredEntity::from_persisted(PersistedEntityData {
        id: EntityId::from_uuid(id),
        record,
        created_at,
        updated_at,
    }))
}

fn is_key_unique_violation(info: &dyn diesel::result::DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == "idx_catalog_entities_type_name")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    fn stored_gateway() -> StoredEntity {
        StoredEntity::new(
            EntityRecord::new(EntityType::Gateway, "upstream")
                .with_tag("prod")
                .with_active(false)
                .with_dependency(EntityType::Root, "workspace")
                .with_field("url", json!("https://upstream.example"))
                .with_secret_field("auth_value", "Y2lwaGVydGV4dA=="),
            &DefaultClock,
        )
    }

    fn into_row(new_row: NewCatalogEntityRow) -> CatalogEntityRow {
        CatalogEntityRow {
            id: new_row.id,
            entity_type: new_row.entity_type,
            name: new_row.name,
            tags: new_row.tags,
            active: new_row.active,
            dependencies: new_row.dependencies,
            fields: new_row.fields,
            secret_fields: new_row.secret_fields,
            created_at: new_row.created_at,
            updated_at: new_row.updated_at,
        }
    }

    #[test]
    fn row_conversion_preserves_the_entity() {
        let entity = stored_gateway();
        let row = to_new_row(&entity).expect("entity converts to a row");

        assert_eq!(row.entity_type, "gateways");
        assert_eq!(row.dependencies, json!([{"type": "roots", "name": "workspace"}]));
        assert_eq!(row_to_entity(into_row(row)).expect("row converts back"), entity);
    }

    #[test]
    fn unknown_persisted_type_is_rejected() {
        let mut row = into_row(to_new_row(&stored_gateway()).expect("entity converts"));
        row.entity_type = "plugins".to_owned();

        assert!(matches!(
            row_to_entity(row),
            Err(CatalogError::InvalidPersistedData(_))
        ));
    }

    #[test]
    fn malformed_persisted_dependencies_are_rejected() {
        let mut row = into_row(to_new_row(&stored_gateway()).expect("entity converts"));
        row.dependencies = json!(["not-an-object"]);

        assert!(matches!(
            row_to_entity(row),
            Err(CatalogError::InvalidPersistedData(_))
        ));
    }
}
