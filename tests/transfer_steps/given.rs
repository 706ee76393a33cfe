//! Given steps for configuration transfer BDD scenarios.

use super::world::{TransferWorld, entity_type, run_async, server_on_port};
use eyre::WrapErr;
use gateway_snapshot::transfer::{
    domain::{EntityKey, EntityRecord, StoredEntity},
    ports::EntityCatalog,
};
use mockable::DefaultClock;
use rstest_bdd_macros::given;

fn store(world: &TransferWorld, record: EntityRecord) -> Result<(), eyre::Report> {
    run_async(world.catalog.insert(&StoredEntity::new(record, &DefaultClock)))
        .wrap_err("seed catalog for scenario")
}

#[given("the catalog holds {count:usize} {kind}")]
fn catalog_holds(world: &TransferWorld, count: usize, kind: String) -> Result<(), eyre::Report> {
    let parsed = entity_type(&kind)?;
    for index in 1..=count {
        store(world, EntityRecord::new(parsed, format!("{kind}-{index}")))?;
    }
    Ok(())
}

#[given(r#"the {kind} "{name}" is inactive"#)]
fn record_is_inactive(
    world: &TransferWorld,
    kind: String,
    name: String,
) -> Result<(), eyre::Report> {
    let key = EntityKey::new(entity_type(&kind)?, name);
    let stored = run_async(world.catalog.find(&key))
        .wrap_err("look up record to deactivate")?
        .ok_or_else(|| eyre::eyre!("expected {key} to be stored"))?;
    let deactivated =
        stored.overwritten_with(stored.record().clone().with_active(false), &DefaultClock);
    run_async(world.catalog.update(&deactivated)).wrap_err("deactivate record")
}

#[given(r#"the catalog holds the server "{name}" on port {port:u16}"#)]
fn catalog_holds_server(
    world: &TransferWorld,
    name: String,
    port: u16,
) -> Result<(), eyre::Report> {
    store(world, server_on_port(&name, port))
}

#[given(r#"a payload with the server "{name}" on port {port:u16}"#)]
fn payload_with_server(world: &mut TransferWorld, name: String, port: u16) {
    world.pending_records.push(server_on_port(&name, port));
}

#[given(r#"a payload with the {kind} named "{name}""#)]
fn payload_with_record(
    world: &mut TransferWorld,
    kind: String,
    name: String,
) -> Result<(), eyre::Report> {
    let parsed = entity_type(&kind)?;
    world.pending_records.push(EntityRecord::new(parsed, name));
    Ok(())
}
