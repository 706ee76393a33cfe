//! In-memory adapters for tests and embedded use.

mod catalog;

pub use catalog::InMemoryEntityCatalog;
