//! Unified path management for regimen files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/regimen/           # Config directory
//! └── config.toml              # Engine configuration
//!
//! ~/.local/share/regimen/      # Data directory
//! └── sessions/
//!     ├── current_session.toml # In-progress companion session
//!     └── history.toml         # Completed sessions
//! ```

use regimen_core::RegimenError;
use std::path::PathBuf;

const APP_DIR: &str = "regimen";

/// Resolves platform directories for regimen.
///
/// An explicit base directory overrides both the config and data roots,
/// which is how tests and the CLI's `--data-dir` flag isolate state.
#[derive(Debug, Clone, Default)]
pub struct RegimenPaths {
    base_override: Option<PathBuf>,
}

impl RegimenPaths {
    pub fn new(base_override: Option<PathBuf>) -> Self {
        Self { base_override }
    }

    /// Returns the configuration directory (e.g., `~/.config/regimen/`).
    pub fn config_dir(&self) -> Result<PathBuf, RegimenError> {
        if let Some(base) = &self.base_override {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| RegimenError::config("Cannot find config directory"))
    }

    /// Returns the data directory (e.g., `~/.local/share/regimen/`).
    pub fn data_dir(&self) -> Result<PathBuf, RegimenError> {
        if let Some(base) = &self.base_override {
            return Ok(base.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| RegimenError::config("Cannot find data directory"))
    }

    pub fn config_file(&self) -> Result<PathBuf, RegimenError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn sessions_dir(&self) -> Result<PathBuf, RegimenError> {
        Ok(self.data_dir()?.join("sessions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_applies_to_all_roots() {
        let paths = RegimenPaths::new(Some(PathBuf::from("/tmp/regimen-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/regimen-test/config.toml")
        );
        assert_eq!(
            paths.sessions_dir().unwrap(),
            PathBuf::from("/tmp/regimen-test/sessions")
        );
    }
}
