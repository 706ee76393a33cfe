//! Shared helpers for in-memory transfer integration tests.

use gateway_snapshot::{
    config::TransferConfig,
    transfer::{
        adapters::memory::InMemoryEntityCatalog,
        domain::{EntityRecord, EntityType, StoredEntity},
        ports::EntityCatalog,
        secrets::{KdfParams, KeyRing, SecretKey},
        services::TransferEngine,
    },
};
use mockable::DefaultClock;
use serde_json::json;
use std::sync::Arc;

/// Engine type used by the integration tests.
pub type TestEngine = TransferEngine<InMemoryEntityCatalog, DefaultClock>;

/// Creates an engine over `catalog` with a fresh active key.
#[must_use]
pub fn engine_over(catalog: &InMemoryEntityCatalog) -> TestEngine {
    let config = TransferConfig {
        kdf: KdfParams::minimal(),
        ..TransferConfig::default()
    };
    TransferEngine::new(
        Arc::new(catalog.clone()),
        Arc::new(DefaultClock),
        Arc::new(KeyRing::new(SecretKey::generate())),
        config,
    )
}

/// A small gateway configuration with cross-type dependencies.
#[must_use]
pub fn sample_records() -> Vec<EntityRecord> {
    vec![
        EntityRecord::new(EntityType::Gateway, "upstream")
            .with_tag("prod")
            .with_field("url", json!("https://upstream.example")),
        EntityRecord::new(EntityType::Root, "workspace").with_field("uri", json!("file:///srv")),
        EntityRecord::new(EntityType::Tool, "search")
            .with_dependency(EntityType::Gateway, "upstream")
            .with_field("timeout", json!(30)),
        EntityRecord::new(EntityType::Prompt, "greeting").with_field("template", json!("Hi")),
        EntityRecord::new(EntityType::Resource, "handbook").with_active(false),
        EntityRecord::new(EntityType::Server, "edge")
            .with_dependency(EntityType::Tool, "search")
            .with_dependency(EntityType::Prompt, "greeting"),
    ]
}

/// Stores `records` in `catalog` in the given order.
///
/// # Errors
///
/// Returns the first catalog error.
pub async fn seed(
    catalog: &InMemoryEntityCatalog,
    records: Vec<EntityRecord>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    for record in records {
        catalog
            .insert(&StoredEntity::new(record, &DefaultClock))
            .await?;
    }
    Ok(())
}

/// Returns the catalog's records, ignoring identifiers and timestamps, sorted
/// by key.
///
/// # Errors
///
/// Returns an error when the catalog cannot be read.
pub fn records_of(
    catalog: &InMemoryEntityCatalog,
) -> Result<Vec<EntityRecord>, Box<dyn std::error::Error + Send + Sync>> {
    let mut records: Vec<EntityRecord> = catalog
        .snapshot()?
        .into_iter()
        .map(StoredEntity::into_record)
        .collect();
    records.sort_by_key(EntityRecord::key);
    Ok(records)
}
