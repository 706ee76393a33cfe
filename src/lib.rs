//! Gateway snapshot: configuration export and import for a federated tool
//! gateway.
//!
//! This crate exports a gateway's configuration entities (tools, upstream
//! gateways, virtual servers, prompts, resources and roots) into a
//! self-describing JSON payload, and reconciles such payloads back into a
//! catalog under a chosen conflict strategy.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, files)
//!
//! # Modules
//!
//! - [`transfer`]: Export selection, import reconciliation and rekeying
//! - [`config`]: Engine configuration loaded from TOML

pub mod config;
pub mod transfer;
