//! Tracing-backed haptics and analytics sinks.
//!
//! Terminal and headless hosts have no vibration motor or analytics backend,
//! so both sinks record what would have been delivered as structured log
//! events under their own targets.

use regimen_core::companion::AnalyticsEvent;
use regimen_core::services::{AnalyticsService, HapticsService};

/// Logs haptic pulses under the `haptics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHaptics;

impl HapticsService for TracingHaptics {
    fn step_completed(&self) {
        tracing::debug!(target: "haptics", pattern = "step_completed", "[Haptics] pulse");
    }

    fn timer_tick(&self) {
        tracing::trace!(target: "haptics", pattern = "timer_tick", "[Haptics] pulse");
    }

    fn timer_complete(&self) {
        tracing::debug!(target: "haptics", pattern = "timer_complete", "[Haptics] pulse");
    }

    fn routine_complete(&self) {
        tracing::debug!(target: "haptics", pattern = "routine_complete", "[Haptics] pulse");
    }
}

/// Logs analytics events as JSON under the `analytics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsService for TracingAnalytics {
    fn track_event(&self, event: &AnalyticsEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => {
                tracing::info!(target: "analytics", event = event.name(), %payload, "[Analytics] track")
            }
            Err(e) => {
                tracing::warn!(target: "analytics", "[Analytics] Failed to encode {}: {}", event.name(), e)
            }
        }
    }
}
