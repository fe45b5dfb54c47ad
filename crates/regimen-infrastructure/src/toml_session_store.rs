//! TOML-based SessionStore implementation

use crate::paths::RegimenPaths;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use regimen_core::clock::{Clock, SystemClock};
use regimen_core::companion::{CompanionSession, CompanionStep, SessionStore};
use regimen_core::error::{RegimenError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CURRENT_FILE: &str = "current_session.toml";
const HISTORY_FILE: &str = "history.toml";

/// On-disk shape of `history.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionHistory {
    #[serde(default)]
    sessions: Vec<CompanionSession>,
}

/// A session store persisting to TOML files.
///
/// ```text
/// base_dir/
/// ├── current_session.toml
/// └── history.toml
/// ```
///
/// File I/O runs on the blocking pool so callers on the async runtime are
/// never stalled by fsync.
#[derive(Clone)]
pub struct TomlSessionStore {
    base_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl TomlSessionStore {
    /// Creates a store rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            clock: Arc::new(SystemClock),
        })
    }

    /// Creates a store in the platform data directory.
    pub fn default_location(paths: &RegimenPaths) -> Result<Self> {
        Self::new(paths.sessions_dir()?)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn current_file(&self) -> AtomicTomlFile<CompanionSession> {
        AtomicTomlFile::new(self.base_dir.join(CURRENT_FILE))
    }

    fn history_file(&self) -> AtomicTomlFile<SessionHistory> {
        AtomicTomlFile::new(self.base_dir.join(HISTORY_FILE))
    }

    /// Runs blocking file work on the blocking pool.
    async fn blocking<F, R>(&self, work: F) -> Result<R>
    where
        F: FnOnce(TomlSessionStore) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || work(store))
            .await
            .map_err(|e| RegimenError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[async_trait]
impl SessionStore for TomlSessionStore {
    async fn start_session(
        &self,
        routine_id: &str,
        routine_name: &str,
        steps: Vec<CompanionStep>,
    ) -> Result<CompanionSession> {
        let session = CompanionSession::new(routine_id, routine_name, steps, self.clock.now());
        self.update_session(&session).await?;
        tracing::info!(
            "[SessionStore] Started session {} for routine '{}'",
            session.id,
            session.routine_id
        );
        Ok(session)
    }

    async fn resume_session(&self) -> Result<Option<CompanionSession>> {
        let session = self
            .blocking(|store| Ok(store.current_file().load()?))
            .await?;
        Ok(session.filter(|s| !s.is_complete()))
    }

    async fn update_session(&self, session: &CompanionSession) -> Result<()> {
        let session = session.clone();
        self.blocking(move |store| Ok(store.current_file().save(&session)?))
            .await
    }

    async fn complete_session(&self) -> Result<()> {
        let now = self.clock.now();
        self.blocking(move |store| {
            let current = store.current_file();
            let Some(mut session) = current.load()? else {
                return Ok(());
            };
            session.mark_completed(now);

            store.history_file().update(SessionHistory::default(), |history| {
                if !history.sessions.iter().any(|s| s.id == session.id) {
                    history.sessions.push(session.clone());
                }
            })?;
            current.remove()?;

            tracing::info!("[SessionStore] Archived session {}", session.id);
            Ok(())
        })
        .await
    }

    async fn abandon_session(&self) -> Result<()> {
        self.blocking(|store| Ok(store.current_file().remove()?)).await
    }

    async fn current_session(&self) -> Option<CompanionSession> {
        match self.blocking(|store| Ok(store.current_file().load()?)).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("[SessionStore] Failed to load current session: {}", e);
                None
            }
        }
    }

    async fn completed_sessions(&self) -> Result<Vec<CompanionSession>> {
        let history = self
            .blocking(|store| Ok(store.history_file().load()?))
            .await?;
        Ok(history.unwrap_or_default().sessions)
    }
}
