use crate::companion::{CompanionStep, DEFAULT_MAX_SECONDS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the companion engine.
///
/// Every field has a default so a partial `config.toml` is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Countdown tick period in milliseconds
    pub tick_interval_ms: u64,
    /// Timers longer than this get a background notification
    pub notification_threshold_secs: u32,
    /// Ticks at or below this many remaining seconds fire a low-time haptic
    pub low_time_threshold_secs: u32,
    /// Floor for manual timer adjustment
    pub min_timer_seconds: u32,
    /// Ceiling for manual timer adjustment when a step has no `max_seconds`
    pub default_max_seconds: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            notification_threshold_secs: 60,
            low_time_threshold_secs: 10,
            min_timer_seconds: 10,
            default_max_seconds: DEFAULT_MAX_SECONDS,
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Adjustment ceiling for `step`.
    pub fn max_seconds_for(&self, step: &CompanionStep) -> u32 {
        step.max_seconds.unwrap_or(self.default_max_seconds)
    }
}

/// Root configuration file (`config.toml`).
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RootConfig {
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Header of a routine definition file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RoutineHeader {
    pub id: String,
    pub name: String,
}

/// A routine definition file: a header plus `[[steps]]` tables.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RoutineDefinition {
    pub routine: RoutineHeader,
    #[serde(default)]
    pub steps: Vec<CompanionStep>,
}

impl RoutineDefinition {
    /// Returns the steps sorted by `order`.
    pub fn ordered_steps(&self) -> Vec<CompanionStep> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|step| step.order);
        steps
    }
}
