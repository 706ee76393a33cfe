//! `PostgreSQL` adapter for the entity catalog.

mod catalog;
mod models;
mod schema;

pub use catalog::{CatalogPgPool, PostgresEntityCatalog};
