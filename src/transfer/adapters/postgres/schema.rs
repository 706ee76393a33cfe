//! Diesel schema for catalog entity persistence.

diesel::table! {
    /// Gateway configuration entities of every type.
    catalog_entities (id) {
        /// Catalog-assigned entity identifier.
        id -> Uuid,
        /// Plural entity type key (`tools`, `gateways`, ...).
        #[max_length = 20]
        entity_type -> Varchar,
        /// Entity name, unique within its type.
        #[max_length = 255]
        name -> Varchar,
        /// Tag set as a JSONB array.
        tags -> Jsonb,
        /// Whether the entity is active.
        active -> Bool,
        /// Referenced entities as a JSONB array of `{type, name}` objects.
        dependencies -> Jsonb,
        /// Opaque attributes as a JSONB object.
        fields -> Jsonb,
        /// Names of attributes holding ciphertext, as a JSONB array.
        secret_fields -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
