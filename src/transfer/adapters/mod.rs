//! Adapter implementations for the catalog port and payload persistence.

pub mod file;
pub mod memory;
pub mod postgres;
