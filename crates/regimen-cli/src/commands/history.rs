use anyhow::Result;
use regimen_core::companion::SessionStore;
use regimen_infrastructure::{RegimenPaths, TomlSessionStore};

/// Prints the most recent completed sessions, newest first.
pub async fn show(paths: &RegimenPaths, limit: usize) -> Result<()> {
    let store = TomlSessionStore::default_location(paths)?;
    let sessions = store.completed_sessions().await?;

    if sessions.is_empty() {
        println!("No completed sessions yet.");
        return Ok(());
    }

    for session in sessions.iter().rev().take(limit) {
        let finished = session.completed_at.unwrap_or(session.started_at);
        println!(
            "{}  {:<24} {}/{} steps  {} skipped  {:.0}%",
            finished.format("%Y-%m-%d %H:%M"),
            session.routine_name,
            session.steps_completed.len(),
            session.step_count(),
            session.skips,
            session.completion_rate() * 100.0
        );
    }
    Ok(())
}
