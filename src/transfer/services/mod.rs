//! Application services for configuration export and import.

mod aggregator;
mod engine;
mod export;
mod import;
mod locks;
mod ordering;
mod view;

pub use engine::TransferEngine;
pub use export::{ExportError, ExportFilter};
pub use import::ImportError;
pub use locks::{CatalogGuard, CatalogLocks, LockMode};
