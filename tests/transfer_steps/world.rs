//! Shared world state for configuration transfer BDD scenarios.

use std::sync::Arc;

use gateway_snapshot::{
    config::TransferConfig,
    transfer::{
        adapters::memory::InMemoryEntityCatalog,
        domain::{
            EntityRecord, EntityType, ExportPayload, ImportResult, PayloadHeader, StoredEntity,
        },
        secrets::{KdfParams, KeyRing, SecretKey},
        services::{ImportError, TransferEngine},
    },
};
use mockable::DefaultClock;
use rstest::fixture;
use std::collections::BTreeMap;

/// Engine type used by the BDD world.
pub type TestEngine = TransferEngine<InMemoryEntityCatalog, DefaultClock>;

/// Scenario world for configuration transfer behaviour tests.
pub struct TransferWorld {
    /// Catalog the engine reads and writes.
    pub catalog: InMemoryEntityCatalog,
    /// The engine under test.
    pub engine: TestEngine,
    /// Records queued for the next import payload.
    pub pending_records: Vec<EntityRecord>,
    /// Catalog contents captured just before the last import.
    pub before_import: Option<Vec<StoredEntity>>,
    /// Result of the last export.
    pub last_export: Option<ExportPayload>,
    /// Outcome of the last import.
    pub last_import: Option<Result<ImportResult, ImportError>>,
}

impl TransferWorld {
    /// Creates a world over an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        let catalog = InMemoryEntityCatalog::new();
        let config = TransferConfig {
            kdf: KdfParams::minimal(),
            ..TransferConfig::default()
        };
        let engine = TransferEngine::new(
            Arc::new(catalog.clone()),
            Arc::new(DefaultClock),
            Arc::new(KeyRing::new(SecretKey::generate())),
            config,
        );
        Self {
            catalog,
            engine,
            pending_records: Vec::new(),
            before_import: None,
            last_export: None,
            last_import: None,
        }
    }

    /// Builds a payload from the queued records.
    #[must_use]
    pub fn pending_payload(&self) -> ExportPayload {
        let mut entities: BTreeMap<EntityType, Vec<EntityRecord>> = BTreeMap::new();
        for record in &self.pending_records {
            entities
                .entry(record.entity_type())
                .or_default()
                .push(record.clone());
        }
        ExportPayload::new(
            PayloadHeader {
                exported_at: chrono::Utc::now(),
                exported_by: "bdd".to_owned(),
                source_identity: "gateway-a".to_owned(),
                source_key_id: None,
            },
            entities,
        )
    }

    /// Returns the result of the last import, whether it completed or
    /// aborted.
    pub fn import_result(&self) -> Result<&ImportResult, eyre::Report> {
        match self.last_import.as_ref() {
            Some(Ok(result)) => Ok(result),
            Some(Err(err)) => err
                .result()
                .ok_or_else(|| eyre::eyre!("import failed without a result: {err}")),
            None => Err(eyre::eyre!("no import has run in scenario world")),
        }
    }
}

impl Default for TransferWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TransferWorld {
    TransferWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Parses an entity type named in a step.
pub fn entity_type(raw: &str) -> Result<EntityType, eyre::Report> {
    EntityType::try_from(raw).map_err(|err| eyre::eyre!("{err}"))
}

/// A server record listening on `port`.
#[must_use]
pub fn server_on_port(name: &str, port: u16) -> EntityRecord {
    EntityRecord::new(EntityType::Server, name).with_field("port", serde_json::json!(port))
}
