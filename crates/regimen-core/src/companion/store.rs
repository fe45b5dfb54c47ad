//! Session store trait.
//!
//! Defines the interface for companion session persistence.

use super::model::CompanionSession;
use super::step::CompanionStep;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for the current companion session.
///
/// The store holds at most one "current" session and treats writes as
/// last-write-wins puts. It decouples the companion engine from the storage
/// mechanism (in-memory, TOML files, remote API).
///
/// # Implementation Notes
///
/// Implementations should:
/// - Return only unfinished sessions from `resume_session`
/// - Make `complete_session` idempotent (archive once, then no-op)
/// - Make `abandon_session` succeed when nothing is stored
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates, stores and returns a new current session.
    ///
    /// Any previously stored current session is replaced.
    async fn start_session(
        &self,
        routine_id: &str,
        routine_name: &str,
        steps: Vec<CompanionStep>,
    ) -> Result<CompanionSession>;

    /// Loads the persisted in-progress session, if any.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(session))`: An unfinished session was found
    /// - `Ok(None)`: Nothing to resume
    /// - `Err(_)`: Error occurred during retrieval
    async fn resume_session(&self) -> Result<Option<CompanionSession>>;

    /// Overwrites the stored current session.
    async fn update_session(&self, session: &CompanionSession) -> Result<()>;

    /// Archives the current session into the completed history and clears it.
    async fn complete_session(&self) -> Result<()>;

    /// Clears the current session without archiving it.
    async fn abandon_session(&self) -> Result<()>;

    /// Returns the stored current session, finished or not.
    async fn current_session(&self) -> Option<CompanionSession>;

    /// Lists archived sessions, oldest first.
    async fn completed_sessions(&self) -> Result<Vec<CompanionSession>>;
}
