//! Export from one catalog and import into another.

use super::helpers::{engine_over, records_of, sample_records, seed};
use gateway_snapshot::transfer::{
    adapters::memory::InMemoryEntityCatalog,
    domain::{ConflictStrategy, EntityType, ImportRequest, ImportStatus},
    services::ExportFilter,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn full_round_trip_reproduces_the_catalog() {
    let source = InMemoryEntityCatalog::new();
    seed(&source, sample_records())
        .await
        .expect("seeding should succeed");
    let target = InMemoryEntityCatalog::new();

    let payload = engine_over(&source)
        .export(&ExportFilter::new().including_inactive(true))
        .await
        .expect("export should succeed");
    let result = engine_over(&target)
        .import(ImportRequest::new(payload))
        .await
        .expect("import should succeed");

    assert_eq!(result.status(), ImportStatus::Completed);
    assert_eq!(result.progress().created, 6);
    assert_eq!(
        records_of(&target).expect("target readable"),
        records_of(&source).expect("source readable")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_export_carries_enough_to_import_cleanly() {
    let source = InMemoryEntityCatalog::new();
    seed(&source, sample_records())
        .await
        .expect("seeding should succeed");
    let target = InMemoryEntityCatalog::new();

    let payload = engine_over(&source)
        .export(&ExportFilter::new().with_types([EntityType::Server]))
        .await
        .expect("export should succeed");
    let result = engine_over(&target)
        .import(ImportRequest::new(payload))
        .await
        .expect("import should succeed");

    assert_eq!(result.status(), ImportStatus::Completed);
    assert_eq!(result.progress().total, 4);
    assert!(result.errors().is_empty());
}

#[rstest]
#[case(ConflictStrategy::Skip, 0, 6)]
#[case(ConflictStrategy::Update, 6, 0)]
#[tokio::test(flavor = "multi_thread")]
async fn reimporting_an_export_never_duplicates(
    #[case] strategy: ConflictStrategy,
    #[case] updated: usize,
    #[case] skipped: usize,
) {
    let catalog = InMemoryEntityCatalog::new();
    seed(&catalog, sample_records())
        .await
        .expect("seeding should succeed");
    let engine = engine_over(&catalog);
    let before = records_of(&catalog).expect("catalog readable");

    let payload = engine
        .export(&ExportFilter::new().including_inactive(true))
        .await
        .expect("export should succeed");
    let result = engine
        .import(ImportRequest::new(payload).with_conflict_strategy(strategy))
        .await
        .expect("import should succeed");

    assert_eq!(result.progress().created, 0);
    assert_eq!(result.progress().updated, updated);
    assert_eq!(result.progress().skipped, skipped);
    assert_eq!(records_of(&catalog).expect("catalog readable"), before);
}
