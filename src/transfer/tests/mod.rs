//! Unit tests for the transfer engine.
//!
//! Tests exercise export selection and import reconciliation end to end over
//! the in-memory catalog, plus rollback failure paths over a mocked catalog.


use crate::config::TransferConfig;
use crate::transfer::{
    adapters::memory::InMemoryEntityCatalog,
    domain::{EntityRecord, EntityType, ExportPayload, PayloadHeader, StoredEntity},
    ports::EntityCatalog,
    secrets::{KdfParams, KeyRing, SecretKey},
    services::TransferEngine,
};
use chrono::Utc;
use mockable::DefaultClock;
use std::collections::BTreeMap;
use std::sync::Arc;

type TestEngine = TransferEngine<InMemoryEntityCatalog, DefaultClock>;

fn test_config() -> TransferConfig {
    TransferConfig {
        kdf: KdfParams::minimal(),
        ..TransferConfig::default()
    }
}

fn engine_with_keys(catalog: &InMemoryEntityCatalog, keys: KeyRing) -> TestEngine {
    TransferEngine::new(
        Arc::new(catalog.clone()),
        Arc::new(DefaultClock),
        Arc::new(keys),
        test_config(),
    )
}

fn engine_over(catalog: &InMemoryEntityCatalog) -> TestEngine {
    engine_with_keys(catalog, KeyRing::new(SecretKey::generate()))
}

fn payload_of(records: Vec<EntityRecord>) -> ExportPayload {
    let mut entities: BTreeMap<EntityType, Vec<EntityRecord>> = BTreeMap::new();
    for record in records {
        entities.entry(record.entity_type()).or_default().push(record);
    }
    ExportPayload::new(
        PayloadHeader {
            exported_at: Utc::now(),
            exported_by: "admin".to_owned(),
            source_identity: "gateway-a".to_owned(),
            source_key_id: None,
        },
        entities,
    )
}

async fn seed(catalog: &InMemoryEntityCatalog, records: Vec<EntityRecord>) {
    for record in records {
        catalog
            .insert(&StoredEntity::new(record, &DefaultClock))
            .await
            .expect("seeding should succeed");
    }
}
