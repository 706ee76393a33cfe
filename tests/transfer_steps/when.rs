//! When steps for configuration transfer BDD scenarios.

use super::world::{TransferWorld, run_async};
use gateway_snapshot::transfer::{
    domain::{ConflictStrategy, ImportRequest, Selection},
    services::ExportFilter,
};
use rstest_bdd_macros::when;

fn parse_strategy(raw: &str) -> Result<ConflictStrategy, eyre::Report> {
    ConflictStrategy::try_from(raw).map_err(|err| eyre::eyre!("{err}"))
}

fn import(world: &mut TransferWorld, request: ImportRequest) -> Result<(), eyre::Report> {
    let before = world
        .catalog
        .snapshot()
        .map_err(|err| eyre::eyre!("snapshot failed: {err}"))?;
    world.before_import = Some(before);
    world.last_import = Some(run_async(world.engine.import(request)));
    Ok(())
}

#[when("the catalog is exported")]
fn export_catalog(world: &mut TransferWorld) -> Result<(), eyre::Report> {
    let payload = run_async(world.engine.export(&ExportFilter::new()))
        .map_err(|err| eyre::eyre!("export failed: {err}"))?;
    world.last_export = Some(payload);
    Ok(())
}

#[when(r#"the payload is imported with the "{strategy}" strategy"#)]
fn import_with_strategy(world: &mut TransferWorld, strategy: String) -> Result<(), eyre::Report> {
    let request = ImportRequest::new(world.pending_payload())
        .with_conflict_strategy(parse_strategy(&strategy)?);
    import(world, request)
}

#[when(r#"the payload is dry-run imported with the "{strategy}" strategy"#)]
fn dry_run_with_strategy(world: &mut TransferWorld, strategy: String) -> Result<(), eyre::Report> {
    let request = ImportRequest::new(world.pending_payload())
        .with_conflict_strategy(parse_strategy(&strategy)?)
        .dry_run();
    import(world, request)
}

#[when(r#"the payload is imported selecting "{selection}""#)]
fn import_selecting(world: &mut TransferWorld, selection: String) -> Result<(), eyre::Report> {
    let parsed = Selection::parse(&selection).map_err(|err| eyre::eyre!("{err}"))?;
    let request = ImportRequest::new(world.pending_payload()).with_selection(parsed);
    import(world, request)
}
