//! Then steps for configuration transfer BDD scenarios.

use super::world::{TransferWorld, entity_type, run_async};
use gateway_snapshot::transfer::{domain::EntityKey, ports::EntityCatalog};
use rstest_bdd_macros::then;

#[then("the export counts {count:usize} {kind}")]
fn export_counts(world: &TransferWorld, count: usize, kind: String) -> Result<(), eyre::Report> {
    let payload = world
        .last_export
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no export has run in scenario world"))?;
    let actual = payload.count(entity_type(&kind)?);
    if actual != count {
        return Err(eyre::eyre!("expected {count} {kind}, found {actual}"));
    }
    Ok(())
}

#[then("the export total is {total:usize}")]
fn export_total(world: &TransferWorld, total: usize) -> Result<(), eyre::Report> {
    let payload = world
        .last_export
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no export has run in scenario world"))?;
    if payload.total() != total {
        return Err(eyre::eyre!(
            "expected total {total}, found {}",
            payload.total()
        ));
    }
    Ok(())
}

#[then("the import reports {count:usize} {counter}")]
fn import_reports(
    world: &TransferWorld,
    count: usize,
    counter: String,
) -> Result<(), eyre::Report> {
    let progress = world.import_result()?.progress();
    let actual = match counter.as_str() {
        "total" => progress.total,
        "created" => progress.created,
        "updated" => progress.updated,
        "skipped" => progress.skipped,
        "failed" => progress.failed,
        other => return Err(eyre::eyre!("unknown counter '{other}'")),
    };
    if actual != count {
        return Err(eyre::eyre!("expected {count} {counter}, found {actual}"));
    }
    Ok(())
}

#[then(r#"the import status is "{status}""#)]
fn import_status(world: &TransferWorld, status: String) -> Result<(), eyre::Report> {
    let actual = world.import_result()?.status();
    if actual.as_str() != status {
        return Err(eyre::eyre!("expected status {status}, found {actual}"));
    }
    Ok(())
}

#[then(r#"the server "{name}" has port {port:u16}"#)]
fn server_has_port(world: &TransferWorld, name: String, port: u16) -> Result<(), eyre::Report> {
    let key = EntityKey::new(entity_type("server")?, name);
    let stored = run_async(world.catalog.find(&key))
        .map_err(|err| eyre::eyre!("lookup failed: {err}"))?
        .ok_or_else(|| eyre::eyre!("expected {key} to exist"))?;
    let actual = stored.record().fields().get("port").cloned();
    if actual != Some(serde_json::json!(port)) {
        return Err(eyre::eyre!("expected {key} on port {port}, found {actual:?}"));
    }
    Ok(())
}

#[then(r#"the {kind} "{name}" exists"#)]
fn record_exists(world: &TransferWorld, kind: String, name: String) -> Result<(), eyre::Report> {
    let key = EntityKey::new(entity_type(&kind)?, name);
    let found = run_async(world.catalog.exists(&key))
        .map_err(|err| eyre::eyre!("lookup failed: {err}"))?;
    if !found {
        return Err(eyre::eyre!("expected {key} to exist"));
    }
    Ok(())
}

#[then(r#"the {kind} "{name}" does not exist"#)]
fn record_absent(world: &TransferWorld, kind: String, name: String) -> Result<(), eyre::Report> {
    let key = EntityKey::new(entity_type(&kind)?, name);
    let found = run_async(world.catalog.exists(&key))
        .map_err(|err| eyre::eyre!("lookup failed: {err}"))?;
    if found {
        return Err(eyre::eyre!("expected {key} to be absent"));
    }
    Ok(())
}

#[then("the catalog is unchanged")]
fn catalog_unchanged(world: &TransferWorld) -> Result<(), eyre::Report> {
    let before = world
        .before_import
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no catalog snapshot was captured"))?;
    let after = world
        .catalog
        .snapshot()
        .map_err(|err| eyre::eyre!("snapshot failed: {err}"))?;
    if &after != before {
        return Err(eyre::eyre!("catalog changed during the import"));
    }
    Ok(())
}
