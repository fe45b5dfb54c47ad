//! Application layer for Regimen.
//!
//! Hosts the companion session engine, which walks a user through a routine
//! step by step and coordinates the collaborators defined in `regimen-core`.

pub mod companion;

pub use companion::{CompanionServices, CompanionSessionEngine, ErrorCallback};
