//! Presentation state of a companion session.

use serde::{Deserialize, Serialize};

/// The finite state machine driving the companion walkthrough.
///
/// Step-scoped variants carry the index of the step they refer to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionState {
    /// No session is loaded.
    #[default]
    Idle,
    /// Showing the step's instructions.
    StepIntro(usize),
    /// Timed step on its timer screen, countdown not started.
    TimerIdle(usize),
    TimerRunning(usize),
    TimerPaused(usize),
    /// Countdown finished or was skipped; waiting for the user to advance.
    StepComplete(usize),
    /// Every step was completed or skipped.
    RoutineComplete,
}

impl SessionState {
    /// Returns the step index carried by step-scoped states.
    pub fn step_index(&self) -> Option<usize> {
        match *self {
            SessionState::StepIntro(i)
            | SessionState::TimerIdle(i)
            | SessionState::TimerRunning(i)
            | SessionState::TimerPaused(i)
            | SessionState::StepComplete(i) => Some(i),
            SessionState::Idle | SessionState::RoutineComplete => None,
        }
    }

    /// Returns true while a session is being walked through.
    pub fn is_active(&self) -> bool {
        self.step_index().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_index() {
        assert_eq!(SessionState::Idle.step_index(), None);
        assert_eq!(SessionState::TimerPaused(3).step_index(), Some(3));
        assert_eq!(SessionState::RoutineComplete.step_index(), None);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_string(&SessionState::TimerRunning(2)).unwrap();
        assert_eq!(json, r#"{"type":"timer_running","data":2}"#);

        let idle: SessionState = serde_json::from_str(r#"{"type":"idle"}"#).unwrap();
        assert_eq!(idle, SessionState::Idle);
    }
}
