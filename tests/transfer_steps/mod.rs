//! Step definitions for configuration transfer scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
