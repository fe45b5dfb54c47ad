//! Companion session domain model.
//!
//! A `CompanionSession` is one run-through of a routine. It owns the step
//! list (fixed at creation) and the traversal bookkeeping; timer state lives
//! outside it and is never persisted.

use super::step::CompanionStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One run-through of a routine.
///
/// Invariants:
/// - `current_step_index` never decreases and never exceeds `steps.len()`
/// - every advance either marks the step in `steps_completed` or increments
///   `skips`, so `steps_completed.len() + skips == current_step_index`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionSession {
    /// Unique session identifier (UUID format)
    pub id: String,
    pub routine_id: String,
    pub routine_name: String,
    /// Ordered steps; the caller supplies them already sorted by `order`
    pub steps: Vec<CompanionStep>,
    /// Index of the step being shown; equals `steps.len()` once complete
    pub current_step_index: usize,
    /// Ids of steps marked done (not skipped)
    #[serde(default)]
    pub steps_completed: BTreeSet<String>,
    /// Number of skipped steps
    #[serde(default)]
    pub skips: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl CompanionSession {
    /// Creates a fresh session positioned at the first step.
    pub fn new(
        routine_id: impl Into<String>,
        routine_name: impl Into<String>,
        steps: Vec<CompanionStep>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            routine_id: routine_id.into(),
            routine_name: routine_name.into(),
            steps,
            current_step_index: 0,
            steps_completed: BTreeSet::new(),
            skips: 0,
            started_at,
            completed_at: None,
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns the step at `current_step_index`, or `None` once complete.
    pub fn current_step(&self) -> Option<&CompanionStep> {
        self.steps.get(self.current_step_index)
    }

    pub fn is_complete(&self) -> bool {
        self.current_step_index >= self.steps.len()
    }

    /// Fraction of steps traversed (completed or skipped); 0 when empty.
    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.current_step_index as f64 / self.steps.len() as f64
    }

    /// Fraction of steps actually completed; 0 when empty.
    pub fn completion_rate(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.steps_completed.len() as f64 / self.steps.len() as f64
    }

    /// Wall time between `started_at` and `completed_at` (or `now`).
    pub fn total_duration_seconds(&self, now: DateTime<Utc>) -> i64 {
        let end = self.completed_at.unwrap_or(now);
        (end - self.started_at).num_seconds().max(0)
    }

    /// Marks the current step done and advances.
    ///
    /// Returns the completed step, or `None` if the session is already
    /// complete.
    pub fn complete_current_step(&mut self) -> Option<CompanionStep> {
        let step = self.current_step()?.clone();
        self.steps_completed.insert(step.id.clone());
        self.current_step_index += 1;
        Some(step)
    }

    /// Skips the current step and advances.
    ///
    /// Returns the skipped step, or `None` if the session is already
    /// complete.
    pub fn skip_current_step(&mut self) -> Option<CompanionStep> {
        let step = self.current_step()?.clone();
        self.skips += 1;
        self.current_step_index += 1;
        Some(step)
    }

    /// Records the completion timestamp. Later calls keep the first value.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn three_steps() -> Vec<CompanionStep> {
        vec![
            CompanionStep::instruction("cleanse", 0, "Cleanse", "Wash face"),
            CompanionStep::timed("serum", 1, "Serum", "Let absorb", 30),
            CompanionStep::instruction("moisturize", 2, "Moisturize", "Apply cream"),
        ]
    }

    #[test]
    fn test_new_session_starts_at_first_step() {
        let session = CompanionSession::new("r1", "Morning", three_steps(), Utc::now());
        assert_eq!(session.current_step_index, 0);
        assert_eq!(session.current_step().unwrap().id, "cleanse");
        assert!(!session.is_complete());
        assert_eq!(session.progress(), 0.0);
        assert!(Uuid::parse_str(&session.id).is_ok());
    }

    #[test]
    fn test_complete_and_skip_accounting() {
        let mut session = CompanionSession::new("r1", "Morning", three_steps(), Utc::now());

        assert_eq!(session.complete_current_step().unwrap().id, "cleanse");
        assert_eq!(session.skip_current_step().unwrap().id, "serum");
        assert_eq!(session.complete_current_step().unwrap().id, "moisturize");

        assert!(session.is_complete());
        assert_eq!(session.skips, 1);
        assert_eq!(session.steps_completed.len() as u32 + session.skips, 3);
        assert!((session.completion_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(session.progress(), 1.0);

        // Advancing past the end is a no-op
        assert!(session.complete_current_step().is_none());
        assert!(session.skip_current_step().is_none());
        assert_eq!(session.current_step_index, 3);
        assert_eq!(session.skips, 1);
    }

    #[test]
    fn test_empty_session_is_complete() {
        let session = CompanionSession::new("r1", "Empty", Vec::new(), Utc::now());
        assert!(session.is_complete());
        assert_eq!(session.progress(), 0.0);
        assert_eq!(session.completion_rate(), 0.0);
    }

    #[test]
    fn test_total_duration_uses_completed_at() {
        let start = Utc::now();
        let mut session = CompanionSession::new("r1", "Morning", three_steps(), start);

        assert_eq!(session.total_duration_seconds(start + Duration::seconds(42)), 42);

        session.mark_completed(start + Duration::seconds(90));
        session.mark_completed(start + Duration::seconds(500));
        assert_eq!(session.total_duration_seconds(start + Duration::seconds(1000)), 90);
    }
}
