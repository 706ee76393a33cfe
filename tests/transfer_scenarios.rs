//! Behaviour tests for configuration export and import.

mod transfer_steps;

use rstest_bdd_macros::scenario;
use transfer_steps::world::{TransferWorld, world};

#[scenario(
    path = "tests/features/config_transfer.feature",
    name = "Export omits inactive records by default"
)]
#[tokio::test(flavor = "multi_thread")]
async fn export_omits_inactive(world: TransferWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_transfer.feature",
    name = "Skip leaves an existing server untouched"
)]
#[tokio::test(flavor = "multi_thread")]
async fn skip_leaves_existing(world: TransferWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_transfer.feature",
    name = "Rename keeps the original and adds a suffixed copy"
)]
#[tokio::test(flavor = "multi_thread")]
async fn rename_adds_suffixed_copy(world: TransferWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_transfer.feature",
    name = "Selection admits only the named tools"
)]
#[tokio::test(flavor = "multi_thread")]
async fn selection_admits_named(world: TransferWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_transfer.feature",
    name = "Fail strategy rolls the catalog back on conflict"
)]
#[tokio::test(flavor = "multi_thread")]
async fn fail_rolls_back(world: TransferWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/config_transfer.feature",
    name = "Dry run reports outcomes without writing"
)]
#[tokio::test(flavor = "multi_thread")]
async fn dry_run_without_writing(world: TransferWorld) {
    let _ = world;
}
