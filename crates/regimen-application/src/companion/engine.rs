//! Companion session engine.
//!
//! Owns one active `CompanionSession` plus its countdown, drives the
//! `SessionState` machine, and emits analytics and haptics as side effects of
//! transitions.
//!
//! Every mutating operation and every tick runs under one async mutex, so
//! operations are serialized. Stopping a countdown cancels its tick handle and
//! bumps the tick generation before the lock is released; a tick that was
//! already waiting on the lock sees a stale generation and does nothing.

use super::services::{CompanionServices, ErrorCallback};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use regimen_core::RegimenError;
use regimen_core::companion::{
    AnalyticsEvent, CompanionSession, CompanionStep, SessionState, TimerState,
};
use regimen_core::config::EngineConfig;
use regimen_core::scheduler::{TickControl, TickFn, TickHandle};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tokio::sync::watch;

/// Guided walkthrough engine for one routine session at a time.
///
/// All operations are infallible from the caller's point of view: calls that
/// do not apply to the current state are ignored, and collaborator failures
/// are reported through [`last_error`](Self::last_error) and the optional
/// error callback without rolling back the transition.
///
/// Dropping the engine cancels any running countdown.
pub struct CompanionSessionEngine {
    shared: Arc<EngineShared>,
}

struct EngineShared {
    services: CompanionServices,
    config: EngineConfig,
    inner: tokio::sync::Mutex<EngineInner>,
    state_tx: watch::Sender<SessionState>,
    last_error: Mutex<Option<RegimenError>>,
    error_callback: RwLock<Option<ErrorCallback>>,
}

#[derive(Default)]
struct EngineInner {
    state: SessionState,
    session: Option<CompanionSession>,
    timer: TimerState,
    tick: Option<TickHandle>,
    /// Identifies the countdown a tick belongs to
    tick_generation: u64,
    notification_scheduled: bool,
    step_entered_at: Option<DateTime<Utc>>,
    /// Set once the store has archived the finished session
    finalized: bool,
}

impl CompanionSessionEngine {
    pub fn new(services: CompanionServices, config: EngineConfig) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            shared: Arc::new(EngineShared {
                services,
                config,
                inner: tokio::sync::Mutex::new(EngineInner::default()),
                state_tx,
                last_error: Mutex::new(None),
                error_callback: RwLock::new(None),
            }),
        }
    }

    // ============================================================================
    // Observation
    // ============================================================================

    /// Current presentation state.
    pub fn state(&self) -> SessionState {
        *self.shared.state_tx.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Snapshot of the active session, if any.
    pub async fn session(&self) -> Option<CompanionSession> {
        self.shared.inner.lock().await.session.clone()
    }

    /// Snapshot of the countdown for the current step.
    pub async fn timer(&self) -> TimerState {
        self.shared.inner.lock().await.timer.clone()
    }

    /// Most recent collaborator failure.
    pub fn last_error(&self) -> Option<RegimenError> {
        self.shared
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_error(&self) {
        *self
            .shared
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Sets a callback invoked on every collaborator failure.
    pub fn set_error_callback(&self, callback: ErrorCallback) {
        *self
            .shared
            .error_callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    // ============================================================================
    // Session lifecycle
    // ============================================================================

    /// Starts a new session, replacing any session in progress.
    ///
    /// An empty step list finishes the routine immediately.
    pub async fn start_session(
        &self,
        routine_id: &str,
        routine_name: &str,
        steps: Vec<CompanionStep>,
    ) {
        self.shared
            .start_session(routine_id, routine_name, steps)
            .await
    }

    /// Restores an unfinished session from the store.
    ///
    /// Returns true if a session is active afterwards.
    pub async fn resume_session(&self) -> bool {
        self.shared.resume_session().await
    }

    /// Archives the finished session through the store. Idempotent.
    pub async fn complete_session(&self) {
        self.shared.complete_session().await
    }

    /// Discards the current session and returns to `Idle`.
    pub async fn abandon_session(&self) {
        self.shared.abandon_session().await
    }

    // ============================================================================
    // Step navigation
    // ============================================================================

    /// Marks the current step done and moves to the next one.
    pub async fn next_step(&self) {
        self.shared.next_step().await
    }

    /// Same as [`next_step`](Self::next_step).
    pub async fn complete_step(&self) {
        self.shared.next_step().await
    }

    /// Skips the current step, stopping its countdown if one is running.
    pub async fn skip_step(&self) {
        self.shared.skip_step().await
    }

    // ============================================================================
    // Timer control
    // ============================================================================

    /// Moves a timed step from its intro to its timer screen.
    pub async fn show_timer(&self) {
        self.shared.show_timer().await
    }

    pub async fn start_timer(&self) {
        self.shared.start_timer().await
    }

    pub async fn pause_timer(&self) {
        self.shared.pause_timer().await
    }

    pub async fn resume_timer(&self) {
        self.shared.resume_timer().await
    }

    pub async fn skip_timer(&self) {
        self.shared.skip_timer().await
    }

    /// Adds `seconds` (possibly negative) to the remaining time.
    pub async fn adjust_timer(&self, seconds: i64) {
        self.shared.adjust_timer(seconds).await
    }

    /// Reconciles a running countdown with wall-clock time after the host
    /// returns to the foreground.
    pub async fn handle_foreground(&self) {
        self.shared.handle_foreground().await
    }
}

impl EngineShared {
    async fn start_session(
        self: &Arc<Self>,
        routine_id: &str,
        routine_name: &str,
        steps: Vec<CompanionStep>,
    ) {
        let mut inner = self.inner.lock().await;
        if let Some(previous) = inner.session.take() {
            // A finished session is archived before it is replaced
            if previous.is_complete() && !inner.finalized {
                if let Err(e) = self.services.store.complete_session().await {
                    self.report("complete session", e);
                }
            }
            tracing::warn!(
                "[Companion] Replacing session {} with a new one for '{}'",
                previous.id,
                routine_id
            );
            self.stop_countdown(&mut inner).await;
        }
        inner.finalized = false;

        let session = match self
            .services
            .store
            .start_session(routine_id, routine_name, steps.clone())
            .await
        {
            Ok(session) => session,
            Err(e) => {
                self.report("start session", e);
                CompanionSession::new(routine_id, routine_name, steps, self.services.clock.now())
            }
        };

        tracing::info!(
            "[Companion] Started session {} for '{}' ({} steps)",
            session.id,
            session.routine_id,
            session.step_count()
        );
        self.track(AnalyticsEvent::CompanionStart {
            routine_id: session.routine_id.clone(),
            step_count: session.step_count(),
        });

        let finished = session.is_complete();
        inner.session = Some(session);
        if finished {
            self.finish_routine(&mut inner).await;
        } else {
            self.enter_step(&mut inner, 0);
        }
    }

    async fn resume_session(self: &Arc<Self>) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state.is_active() {
            return true;
        }

        let session = match self.services.store.resume_session().await {
            Ok(Some(session)) if !session.is_complete() => session,
            Ok(_) => return false,
            Err(e) => {
                self.report("resume session", e);
                return false;
            }
        };

        self.stop_countdown(&mut inner).await;
        let index = session.current_step_index;
        tracing::info!(
            "[Companion] Resumed session {} at step {}/{}",
            session.id,
            index + 1,
            session.step_count()
        );
        inner.session = Some(session);
        inner.finalized = false;
        self.enter_step(&mut inner, index);
        true
    }

    async fn complete_session(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        match inner.session.as_ref() {
            Some(session) if session.is_complete() => {}
            Some(_) => {
                tracing::debug!("[Companion] complete_session ignored: routine not finished");
                return;
            }
            None => return,
        }
        if inner.finalized {
            return;
        }

        match self.services.store.complete_session().await {
            Ok(()) => inner.finalized = true,
            Err(e) => self.report("complete session", e),
        }
    }

    async fn abandon_session(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        let Some(session) = inner.session.take() else {
            return;
        };
        self.stop_countdown(&mut inner).await;

        if session.is_complete() {
            // Finished sessions are archived, not abandoned
            if !inner.finalized {
                if let Err(e) = self.services.store.complete_session().await {
                    self.report("complete session", e);
                }
            }
        } else {
            if let Err(e) = self.services.store.abandon_session().await {
                self.report("abandon session", e);
            }
            tracing::info!(
                "[Companion] Abandoned session {} at step {}/{}",
                session.id,
                session.current_step_index + 1,
                session.step_count()
            );
            self.track(AnalyticsEvent::CompanionAbandon {
                routine_id: session.routine_id.clone(),
                current_step: session.current_step_index,
                total_steps: session.step_count(),
            });
        }

        inner.finalized = false;
        inner.step_entered_at = None;
        self.set_state(&mut inner, SessionState::Idle);
    }

    async fn next_step(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            SessionState::StepIntro(i) | SessionState::TimerIdle(i) | SessionState::StepComplete(i) => {
                self.advance(&mut inner, i, false).await
            }
            state => tracing::debug!("[Companion] next_step ignored in {:?}", state),
        }
    }

    async fn skip_step(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        let index = match inner.state {
            SessionState::StepIntro(i) | SessionState::TimerIdle(i) => i,
            SessionState::TimerRunning(i) | SessionState::TimerPaused(i) => {
                self.stop_countdown(&mut inner).await;
                i
            }
            state => {
                tracing::debug!("[Companion] skip_step ignored in {:?}", state);
                return;
            }
        };
        self.advance(&mut inner, index, true).await;
    }

    async fn show_timer(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        if let SessionState::StepIntro(i) = inner.state {
            if Self::step_at(&inner, i).is_some_and(CompanionStep::is_timed) {
                self.set_state(&mut inner, SessionState::TimerIdle(i));
            }
        }
    }

    async fn start_timer(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        let index = match inner.state {
            SessionState::StepIntro(i) | SessionState::TimerIdle(i) => i,
            state => {
                tracing::debug!("[Companion] start_timer ignored in {:?}", state);
                return;
            }
        };
        let Some(step) = Self::step_at(&inner, index).cloned() else {
            return;
        };
        let Some(wait_seconds) = step.wait_seconds.filter(|_| step.is_timed()) else {
            tracing::debug!("[Companion] start_timer ignored: step '{}' is not timed", step.id);
            return;
        };

        inner.timer = TimerState::started(wait_seconds, self.services.clock.now());
        self.track(AnalyticsEvent::TimerStart {
            step_id: step.id.clone(),
            planned_wait: wait_seconds,
        });
        self.set_state(&mut inner, SessionState::TimerRunning(index));

        if wait_seconds == 0 {
            self.finish_countdown(&mut inner, index).await;
            return;
        }
        self.start_ticking(&mut inner);
        self.schedule_notification(&mut inner, wait_seconds, &step.title)
            .await;
        tracing::info!("[Companion] Timer started for '{}' ({}s)", step.id, wait_seconds);
    }

    async fn pause_timer(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        let SessionState::TimerRunning(index) = inner.state else {
            return;
        };

        Self::cancel_tick(&mut inner);
        inner.timer.pause(self.services.clock.now());
        self.cancel_notification(&mut inner).await;

        if let Some(step) = Self::step_at(&inner, index) {
            self.track(AnalyticsEvent::TimerPause {
                step_id: step.id.clone(),
                remaining_seconds: inner.timer.remaining_seconds,
            });
        }
        self.set_state(&mut inner, SessionState::TimerPaused(index));
    }

    async fn resume_timer(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        let SessionState::TimerPaused(index) = inner.state else {
            return;
        };

        inner.timer.resume(self.services.clock.now());
        self.start_ticking(&mut inner);

        let remaining = inner.timer.remaining_seconds;
        if let Some(step) = Self::step_at(&inner, index).cloned() {
            self.schedule_notification(&mut inner, remaining, &step.title)
                .await;
            self.track(AnalyticsEvent::TimerResume {
                step_id: step.id,
                remaining_seconds: remaining,
            });
        }
        self.set_state(&mut inner, SessionState::TimerRunning(index));
    }

    async fn skip_timer(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        let index = match inner.state {
            SessionState::TimerRunning(i) | SessionState::TimerPaused(i) => i,
            _ => return,
        };

        let remaining = inner.timer.remaining_seconds;
        self.stop_countdown(&mut inner).await;
        if let Some(step) = Self::step_at(&inner, index) {
            self.track(AnalyticsEvent::TimerSkip {
                step_id: step.id.clone(),
                remaining_seconds: remaining,
            });
        }
        self.set_state(&mut inner, SessionState::StepComplete(index));
    }

    async fn adjust_timer(self: &Arc<Self>, seconds: i64) {
        let mut inner = self.inner.lock().await;
        let (index, running) = match inner.state {
            SessionState::TimerRunning(i) => (i, true),
            SessionState::TimerPaused(i) => (i, false),
            _ => return,
        };
        let Some(step) = Self::step_at(&inner, index).cloned() else {
            return;
        };

        let max = self.config.max_seconds_for(&step);
        let now = self.services.clock.now();
        let remaining = inner
            .timer
            .adjust(seconds, self.config.min_timer_seconds, max, now);
        tracing::debug!("[Companion] Timer for '{}' adjusted to {}s", step.id, remaining);

        if running {
            self.cancel_notification(&mut inner).await;
            self.schedule_notification(&mut inner, remaining, &step.title)
                .await;
        }
    }

    async fn handle_foreground(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        let SessionState::TimerRunning(index) = inner.state else {
            return;
        };

        let remaining = inner.timer.reconcile(self.services.clock.now());
        tracing::debug!("[Companion] Reconciled timer: {}s remaining", remaining);
        if remaining == 0 {
            self.finish_countdown(&mut inner, index).await;
        }
    }

    async fn on_tick(self: &Arc<Self>, generation: u64) -> TickControl {
        let mut inner = self.inner.lock().await;
        if generation != inner.tick_generation {
            return TickControl::Stop;
        }
        let SessionState::TimerRunning(index) = inner.state else {
            return TickControl::Stop;
        };
        let Some(remaining) = inner.timer.tick() else {
            return TickControl::Stop;
        };

        if remaining == 0 {
            self.finish_countdown(&mut inner, index).await;
            return TickControl::Stop;
        }
        if remaining <= self.config.low_time_threshold_secs {
            self.services.haptics.timer_tick();
        }
        TickControl::Continue
    }

    // ============================================================================
    // Transition helpers (called with the inner lock held)
    // ============================================================================

    /// Marks step `index` completed or skipped and moves past it.
    async fn advance(self: &Arc<Self>, inner: &mut EngineInner, index: usize, skipped: bool) {
        let now = self.services.clock.now();
        let actual_wait = inner
            .step_entered_at
            .map(|entered| (now - entered).num_seconds().max(0))
            .unwrap_or(0);

        let Some(session) = inner.session.as_mut() else {
            return;
        };
        if session.current_step_index != index {
            tracing::debug!(
                "[Companion] advance ignored: state step {} != session step {}",
                index,
                session.current_step_index
            );
            return;
        }
        let step = if skipped {
            session.skip_current_step()
        } else {
            session.complete_current_step()
        };
        let Some(step) = step else {
            return;
        };
        let snapshot = session.clone();

        if !skipped && step.haptics {
            self.services.haptics.step_completed();
        }
        self.track(AnalyticsEvent::StepComplete {
            step_id: step.id,
            actual_wait,
            was_skipped: skipped,
        });

        if snapshot.is_complete() {
            self.finish_routine(inner).await;
        } else {
            self.persist(&snapshot).await;
            self.enter_step(inner, snapshot.current_step_index);
        }
    }

    async fn finish_routine(&self, inner: &mut EngineInner) {
        let now = self.services.clock.now();
        let Some(session) = inner.session.as_mut() else {
            return;
        };
        session.mark_completed(now);
        let snapshot = session.clone();

        self.persist(&snapshot).await;
        let total_duration = snapshot.total_duration_seconds(now);
        tracing::info!(
            "[Companion] Routine '{}' complete in {}s ({} skipped)",
            snapshot.routine_id,
            total_duration,
            snapshot.skips
        );
        self.track(AnalyticsEvent::CompanionComplete {
            routine_id: snapshot.routine_id.clone(),
            total_duration,
            skips: snapshot.skips,
            completion_rate: snapshot.completion_rate(),
        });
        self.services.haptics.routine_complete();

        inner.step_entered_at = None;
        self.set_state(inner, SessionState::RoutineComplete);
    }

    fn enter_step(&self, inner: &mut EngineInner, index: usize) {
        inner.timer.reset();
        inner.step_entered_at = Some(self.services.clock.now());
        if let Some(step) = Self::step_at(inner, index) {
            self.track(AnalyticsEvent::StepView {
                step_id: step.id.clone(),
                step_order: step.order,
                step_type: step.step_type.as_str().to_string(),
            });
        }
        self.set_state(inner, SessionState::StepIntro(index));
    }

    /// Natural end of a countdown (tick or reconciliation reached zero).
    async fn finish_countdown(&self, inner: &mut EngineInner, index: usize) {
        self.stop_countdown(inner).await;
        self.services.haptics.timer_complete();
        tracing::info!("[Companion] Timer finished for step {}", index + 1);
        self.set_state(inner, SessionState::StepComplete(index));
    }

    /// Cancels the tick and any alarm, and clears the countdown.
    async fn stop_countdown(&self, inner: &mut EngineInner) {
        Self::cancel_tick(inner);
        inner.timer.reset();
        self.cancel_notification(inner).await;
    }

    fn start_ticking(self: &Arc<Self>, inner: &mut EngineInner) {
        Self::cancel_tick(inner);
        let generation = inner.tick_generation;
        let handle = self
            .services
            .scheduler
            .schedule(self.config.tick_interval(), Self::tick_fn(Arc::downgrade(self), generation));
        inner.tick = Some(handle);
    }

    fn cancel_tick(inner: &mut EngineInner) {
        if let Some(handle) = inner.tick.take() {
            handle.cancel();
        }
        inner.tick_generation = inner.tick_generation.wrapping_add(1);
    }

    fn tick_fn(engine: Weak<EngineShared>, generation: u64) -> TickFn {
        Arc::new(move || {
            let engine = engine.clone();
            async move {
                match engine.upgrade() {
                    Some(engine) => engine.on_tick(generation).await,
                    None => TickControl::Stop,
                }
            }
            .boxed()
        })
    }

    async fn schedule_notification(&self, inner: &mut EngineInner, seconds: u32, title: &str) {
        if seconds <= self.config.notification_threshold_secs {
            return;
        }
        match self
            .services
            .notifications
            .schedule_timer_notification(seconds, title)
            .await
        {
            Ok(()) => inner.notification_scheduled = true,
            Err(e) => self.report("schedule notification", e),
        }
    }

    async fn cancel_notification(&self, inner: &mut EngineInner) {
        if !inner.notification_scheduled {
            return;
        }
        inner.notification_scheduled = false;
        if let Err(e) = self.services.notifications.cancel_timer_notifications().await {
            self.report("cancel notification", e);
        }
    }

    async fn persist(&self, session: &CompanionSession) {
        if let Err(e) = self.services.store.update_session(session).await {
            self.report("persist session", e);
        }
    }

    fn step_at(inner: &EngineInner, index: usize) -> Option<&CompanionStep> {
        inner.session.as_ref().and_then(|s| s.steps.get(index))
    }

    fn set_state(&self, inner: &mut EngineInner, state: SessionState) {
        if inner.state != state {
            tracing::debug!("[Companion] {:?} -> {:?}", inner.state, state);
        }
        inner.state = state;
        self.state_tx.send_replace(state);
    }

    fn track(&self, event: AnalyticsEvent) {
        self.services.analytics.track_event(&event);
    }

    fn report(&self, context: &str, error: RegimenError) {
        tracing::warn!("[Companion] Failed to {}: {}", context, error);
        let callback = self
            .error_callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(&error);
        }
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }
}
