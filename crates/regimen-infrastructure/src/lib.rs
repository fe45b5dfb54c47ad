//! Infrastructure layer for Regimen.
//!
//! Concrete implementations of the collaborator traits defined in
//! `regimen-core`: session stores, the tick scheduler, local alarms and
//! logging sinks.

pub mod config_service;
pub mod feedback;
pub mod memory_session_store;
pub mod notification;
pub mod paths;
pub mod storage;
pub mod tick_scheduler;
pub mod toml_session_store;

pub use crate::config_service::ConfigService;
pub use crate::feedback::{TracingAnalytics, TracingHaptics};
pub use crate::memory_session_store::InMemorySessionStore;
pub use crate::notification::{FiredAlarm, LocalAlarmNotificationService};
pub use crate::paths::RegimenPaths;
pub use crate::tick_scheduler::TokioTickScheduler;
pub use crate::toml_session_store::TomlSessionStore;
