//! Companion session domain module.
//!
//! This module contains the guided-routine domain models and the store
//! interface the companion engine persists through.
//!
//! # Module Structure
//!
//! - `step`: Routine step types (`CompanionStep`, `StepType`)
//! - `model`: Session entity (`CompanionSession`)
//! - `timer`: Countdown state (`TimerState`)
//! - `state`: Presentation state machine (`SessionState`)
//! - `event`: Analytics payloads (`AnalyticsEvent`)
//! - `store`: Persistence trait (`SessionStore`)

mod event;
mod model;
mod state;
mod step;
mod store;
mod timer;

pub use event::AnalyticsEvent;
pub use model::CompanionSession;
pub use state::SessionState;
pub use step::{CompanionStep, DEFAULT_MAX_SECONDS, StepType};
pub use store::SessionStore;
pub use timer::TimerState;
