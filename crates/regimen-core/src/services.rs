//! Side-effect collaborators consumed by the companion engine.
//!
//! Haptics and analytics are pure sinks: the engine fires and forgets.
//! Notification scheduling can fail and reports it so the engine can surface
//! the failure on its error channel.

use crate::companion::AnalyticsEvent;
use crate::error::Result;
use async_trait::async_trait;

/// Schedules local wall-clock alarms for long-running timers.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Schedules an alarm to fire after `seconds`.
    async fn schedule_timer_notification(&self, seconds: u32, step_title: &str) -> Result<()>;

    /// Cancels every pending timer alarm. Succeeds when none are pending.
    async fn cancel_timer_notifications(&self) -> Result<()>;
}

/// Tactile feedback sink.
pub trait HapticsService: Send + Sync {
    fn step_completed(&self);

    /// Low-time pulse fired on each tick in the final seconds.
    fn timer_tick(&self);

    fn timer_complete(&self);

    fn routine_complete(&self);
}

/// Product analytics sink.
pub trait AnalyticsService: Send + Sync {
    fn track_event(&self, event: &AnalyticsEvent);
}
