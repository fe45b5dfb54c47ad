use serde::{Deserialize, Serialize};

/// Analytics events emitted on companion state transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    CompanionStart {
        routine_id: String,
        step_count: usize,
    },
    CompanionComplete {
        routine_id: String,
        /// Seconds between session start and completion
        total_duration: i64,
        skips: u32,
        /// Completed steps over total steps, in `[0, 1]`
        completion_rate: f64,
    },
    CompanionAbandon {
        routine_id: String,
        current_step: usize,
        total_steps: usize,
    },
    StepComplete {
        step_id: String,
        /// Seconds spent on the step before advancing
        actual_wait: i64,
        was_skipped: bool,
    },
    StepView {
        step_id: String,
        step_order: u32,
        step_type: String,
    },
    TimerStart {
        step_id: String,
        planned_wait: u32,
    },
    TimerPause {
        step_id: String,
        remaining_seconds: u32,
    },
    TimerResume {
        step_id: String,
        remaining_seconds: u32,
    },
    TimerSkip {
        step_id: String,
        remaining_seconds: u32,
    },
}

impl AnalyticsEvent {
    /// Returns the event name as it appears in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::CompanionStart { .. } => "companion_start",
            AnalyticsEvent::CompanionComplete { .. } => "companion_complete",
            AnalyticsEvent::CompanionAbandon { .. } => "companion_abandon",
            AnalyticsEvent::StepComplete { .. } => "step_complete",
            AnalyticsEvent::StepView { .. } => "step_view",
            AnalyticsEvent::TimerStart { .. } => "timer_start",
            AnalyticsEvent::TimerPause { .. } => "timer_pause",
            AnalyticsEvent::TimerResume { .. } => "timer_resume",
            AnalyticsEvent::TimerSkip { .. } => "timer_skip",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_tag() {
        let event = AnalyticsEvent::TimerSkip {
            step_id: "serum".to_string(),
            remaining_seconds: 12,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.name());
        assert_eq!(value["remaining_seconds"], 12);
    }
}
