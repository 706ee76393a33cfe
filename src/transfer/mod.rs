//! Gateway configuration export and import reconciliation.
//!
//! The export side selects stored entities by type, tag and activity and
//! closes the selection over entity dependencies. The import side merges an
//! export payload into a catalog under a conflict strategy, optionally as a
//! dry run, and rekeys secret-bearing fields when crossing environments. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Secret handling in [`secrets`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod secrets;
pub mod services;

#[cfg(test)]
mod tests;
