//! Port contracts for configuration export and import.

mod catalog;

pub use catalog::{CatalogError, CatalogIdentity, CatalogResult, EntityCatalog};
