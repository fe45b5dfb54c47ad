//! Countdown state for timed steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ephemeral countdown for the current timed step.
///
/// `remaining_seconds` is decremented by ticks, but the authoritative value
/// after a suspension is recomputed from `start_time` and `anchor_remaining`
/// (see [`TimerState::reconcile`]). Every operation that changes the rate or
/// amount of remaining time re-anchors both fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_running: bool,
    pub is_paused: bool,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    /// When the countdown was last (re)started
    pub start_time: Option<DateTime<Utc>>,
    pub pause_time: Option<DateTime<Utc>>,
    /// Remaining seconds at `start_time`
    pub anchor_remaining: u32,
}

impl TimerState {
    /// Creates a running countdown of `total_seconds`.
    pub fn started(total_seconds: u32, now: DateTime<Utc>) -> Self {
        Self {
            is_running: true,
            is_paused: false,
            remaining_seconds: total_seconds,
            total_seconds,
            start_time: Some(now),
            pause_time: None,
            anchor_remaining: total_seconds,
        }
    }

    /// Returns true while the countdown should be decremented.
    pub fn is_ticking(&self) -> bool {
        self.is_running && !self.is_paused
    }

    /// Decrements one second if ticking.
    ///
    /// Returns the new remaining value, or `None` if the timer is not ticking.
    pub fn tick(&mut self) -> Option<u32> {
        if !self.is_ticking() {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        Some(self.remaining_seconds)
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.is_ticking() {
            self.is_paused = true;
            self.pause_time = Some(now);
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.is_running && self.is_paused {
            self.is_paused = false;
            self.pause_time = None;
            self.reanchor(now);
        }
    }

    /// Moves remaining time by `delta` seconds, clamped to `[min, max]`.
    ///
    /// `total_seconds` grows with the remaining time so progress stays within
    /// `[0, 1]`. Returns the clamped remaining value.
    pub fn adjust(&mut self, delta: i64, min: u32, max: u32, now: DateTime<Utc>) -> u32 {
        let upper = max.max(min);
        let target = (self.remaining_seconds as i64).saturating_add(delta);
        let clamped = target.clamp(min as i64, upper as i64) as u32;

        self.remaining_seconds = clamped;
        self.total_seconds = self.total_seconds.max(clamped);
        if self.is_ticking() {
            self.reanchor(now);
        } else {
            self.anchor_remaining = clamped;
        }
        clamped
    }

    /// Recomputes remaining time from wall-clock elapsed time.
    ///
    /// Only a ticking timer is reconciled. The result never exceeds the
    /// current remaining time (ticks may run ahead of the wall clock), is
    /// clamped at zero, and calling this twice with the same `now` yields the
    /// same state.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> u32 {
        if let (true, Some(start)) = (self.is_ticking(), self.start_time) {
            let elapsed = (now - start).num_seconds().max(0);
            let remaining = (self.anchor_remaining as i64 - elapsed).max(0);
            self.remaining_seconds = (remaining as u32).min(self.remaining_seconds);
        }
        self.remaining_seconds
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fraction of the countdown elapsed; 0 when `total_seconds` is 0.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.total_seconds - self.remaining_seconds.min(self.total_seconds)) as f64
            / self.total_seconds as f64
    }

    /// Remaining time as `M:SS`.
    pub fn formatted_time(&self) -> String {
        format!(
            "{}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }

    fn reanchor(&mut self, now: DateTime<Utc>) {
        self.start_time = Some(now);
        self.anchor_remaining = self.remaining_seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_tick_only_while_running() {
        let now = Utc::now();
        let mut timer = TimerState::default();
        assert_eq!(timer.tick(), None);

        timer = TimerState::started(3, now);
        assert_eq!(timer.tick(), Some(2));

        timer.pause(now);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining_seconds, 2);

        timer.resume(now);
        assert_eq!(timer.tick(), Some(1));
        assert_eq!(timer.tick(), Some(0));
        assert_eq!(timer.tick(), Some(0));
    }

    #[test]
    fn test_adjust_clamps_both_directions() {
        let now = Utc::now();
        let mut timer = TimerState::started(30, now);

        assert_eq!(timer.adjust(-1000, 10, 600, now), 10);
        assert_eq!(timer.adjust(1000, 10, 60, now), 60);
        assert_eq!(timer.total_seconds, 60);
        assert_eq!(timer.adjust(-15, 10, 60, now), 45);
        assert_eq!(timer.total_seconds, 60);
    }

    #[test]
    fn test_reconcile_after_suspension() {
        let start = Utc::now();
        let mut timer = TimerState::started(60, start);
        timer.tick();

        assert_eq!(timer.reconcile(start + Duration::seconds(25)), 35);
        assert_eq!(timer.reconcile(start + Duration::seconds(25)), 35);
        assert_eq!(timer.reconcile(start + Duration::seconds(70)), 0);
    }

    #[test]
    fn test_reconcile_never_adds_time() {
        let start = Utc::now();
        let mut timer = TimerState::started(45, start);
        for _ in 0..5 {
            timer.tick();
        }

        // Wall clock lags behind the ticks
        assert_eq!(timer.reconcile(start), 40);
        assert_eq!(timer.reconcile(start + Duration::seconds(2)), 40);
        assert_eq!(timer.reconcile(start + Duration::seconds(8)), 37);
    }

    #[test]
    fn test_reconcile_ignores_paused_time() {
        let start = Utc::now();
        let mut timer = TimerState::started(60, start);

        timer.remaining_seconds = 50;
        timer.pause(start + Duration::seconds(10));
        assert_eq!(timer.reconcile(start + Duration::seconds(300)), 50);

        timer.resume(start + Duration::seconds(300));
        assert_eq!(timer.reconcile(start + Duration::seconds(320)), 30);
    }

    #[test]
    fn test_progress_and_format() {
        let mut timer = TimerState::started(90, Utc::now());
        assert_eq!(timer.formatted_time(), "1:30");
        assert_eq!(timer.progress(), 0.0);

        timer.remaining_seconds = 45;
        assert_eq!(timer.formatted_time(), "0:45");
        assert!((timer.progress() - 0.5).abs() < f64::EPSILON);

        timer.reset();
        assert_eq!(timer.progress(), 0.0);
        assert!(!timer.is_running);
    }
}
