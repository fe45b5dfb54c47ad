//! Domain layer for Regimen.
//!
//! Holds the guided-routine models, the presentation state machine type and
//! the collaborator traits the companion engine is built against.

pub mod clock;
pub mod companion;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod services;

// Re-export common error type
pub use error::RegimenError;
