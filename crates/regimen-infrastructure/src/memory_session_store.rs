//! In-memory SessionStore implementation.

use async_trait::async_trait;
use regimen_core::clock::{Clock, SystemClock};
use regimen_core::companion::{CompanionSession, CompanionStep, SessionStore};
use regimen_core::error::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct StoreState {
    current: Option<CompanionSession>,
    history: Vec<CompanionSession>,
}

/// A session store that keeps everything in process memory.
///
/// Used as the default store when nothing needs to survive a restart, and
/// as the reference implementation of the `SessionStore` contract.
#[derive(Clone)]
pub struct InMemorySessionStore {
    state: Arc<RwLock<StoreState>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a store that stamps new sessions with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            clock,
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn start_session(
        &self,
        routine_id: &str,
        routine_name: &str,
        steps: Vec<CompanionStep>,
    ) -> Result<CompanionSession> {
        let session = CompanionSession::new(routine_id, routine_name, steps, self.clock.now());
        self.state.write().await.current = Some(session.clone());
        Ok(session)
    }

    async fn resume_session(&self) -> Result<Option<CompanionSession>> {
        let state = self.state.read().await;
        Ok(state.current.clone().filter(|s| !s.is_complete()))
    }

    async fn update_session(&self, session: &CompanionSession) -> Result<()> {
        self.state.write().await.current = Some(session.clone());
        Ok(())
    }

    async fn complete_session(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(mut session) = state.current.take() else {
            return Ok(());
        };

        session.mark_completed(self.clock.now());
        if !state.history.iter().any(|s| s.id == session.id) {
            state.history.push(session);
        }
        Ok(())
    }

    async fn abandon_session(&self) -> Result<()> {
        self.state.write().await.current = None;
        Ok(())
    }

    async fn current_session(&self) -> Option<CompanionSession> {
        self.state.read().await.current.clone()
    }

    async fn completed_sessions(&self) -> Result<Vec<CompanionSession>> {
        Ok(self.state.read().await.history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps() -> Vec<CompanionStep> {
        vec![
            CompanionStep::instruction("cleanse", 0, "Cleanse", "Wash"),
            CompanionStep::timed("serum", 1, "Serum", "Wait", 30),
        ]
    }

    #[tokio::test]
    async fn test_start_and_resume() {
        let store = InMemorySessionStore::new();
        assert!(store.resume_session().await.unwrap().is_none());

        let session = store.start_session("am", "Morning", steps()).await.unwrap();
        let resumed = store.resume_session().await.unwrap().unwrap();
        assert_eq!(resumed.id, session.id);
    }

    #[tokio::test]
    async fn test_resume_skips_finished_session() {
        let store = InMemorySessionStore::new();
        let mut session = store.start_session("am", "Morning", steps()).await.unwrap();
        session.complete_current_step();
        session.skip_current_step();
        store.update_session(&session).await.unwrap();

        assert!(store.resume_session().await.unwrap().is_none());
        assert!(store.current_session().await.is_some());
    }

    #[tokio::test]
    async fn test_complete_is_idempotent() {
        let store = InMemorySessionStore::new();
        store.start_session("am", "Morning", steps()).await.unwrap();

        store.complete_session().await.unwrap();
        store.complete_session().await.unwrap();

        let history = store.completed_sessions().await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].completed_at.is_some());
        assert!(store.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_abandon_clears_current() {
        let store = InMemorySessionStore::new();
        store.start_session("am", "Morning", steps()).await.unwrap();
        store.abandon_session().await.unwrap();
        store.abandon_session().await.unwrap();

        assert!(store.current_session().await.is_none());
        assert!(store.completed_sessions().await.unwrap().is_empty());
    }
}
