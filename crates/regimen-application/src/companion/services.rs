use regimen_core::RegimenError;
use regimen_core::clock::Clock;
use regimen_core::companion::SessionStore;
use regimen_core::scheduler::TickScheduler;
use regimen_core::services::{AnalyticsService, HapticsService, NotificationService};
use std::sync::Arc;

/// Callback type for collaborator failures (for UI notifications).
pub type ErrorCallback = Arc<dyn Fn(&RegimenError) + Send + Sync>;

/// Collaborators injected into the companion engine.
#[derive(Clone)]
pub struct CompanionServices {
    /// Persistence for the current session
    pub store: Arc<dyn SessionStore>,
    /// Background alarms for long timers
    pub notifications: Arc<dyn NotificationService>,
    pub haptics: Arc<dyn HapticsService>,
    pub analytics: Arc<dyn AnalyticsService>,
    /// Wall-clock source used for reconciliation and durations
    pub clock: Arc<dyn Clock>,
    /// Drives the countdown tick
    pub scheduler: Arc<dyn TickScheduler>,
}
