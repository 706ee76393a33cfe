//! Payloads persisted to disk between export and import.

use super::helpers::{engine_over, records_of, sample_records, seed};
use camino::Utf8Path;
use gateway_snapshot::transfer::{
    adapters::{file::PayloadFileStore, memory::InMemoryEntityCatalog},
    domain::{ImportRequest, ImportStatus},
    services::ExportFilter,
};
use mockable::DefaultClock;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread")]
async fn exported_file_imports_into_a_fresh_catalog() {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8Path::from_path(temp.path()).expect("utf-8 temp path");
    let files =
        PayloadFileStore::open_ambient(root, Arc::new(DefaultClock)).expect("store opens");
    let source = InMemoryEntityCatalog::new();
    seed(&source, sample_records())
        .await
        .expect("seeding should succeed");

    let payload = engine_over(&source)
        .export(&ExportFilter::new())
        .await
        .expect("export should succeed");
    let written = files.write(None, &payload).expect("payload written");
    let restored = files.read(&written).expect("payload read back");

    let target = InMemoryEntityCatalog::new();
    let result = engine_over(&target)
        .import(ImportRequest::new(restored))
        .await
        .expect("import should succeed");

    assert_eq!(result.status(), ImportStatus::Completed);
    assert_eq!(result.progress().total, payload.total());
    assert_eq!(records_of(&target).expect("target readable").len(), 5);
}
