//! In-memory catalog integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `round_trip_tests`: Export from one catalog and import into another
//! - `file_store_tests`: Payloads persisted to disk between export and import

mod in_memory {
    pub mod helpers;

    mod file_store_tests;
    mod round_trip_tests;
}
