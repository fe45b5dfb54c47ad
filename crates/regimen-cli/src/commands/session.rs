//! Interactive companion session in the terminal.

use super::input::{Command, HELP};
use anyhow::{Context, Result};
use regimen_application::{CompanionServices, CompanionSessionEngine, ErrorCallback};
use regimen_core::RegimenError;
use regimen_core::clock::{Clock, SystemClock};
use regimen_core::companion::SessionState;
use regimen_core::config::RoutineDefinition;
use regimen_infrastructure::{
    ConfigService, FiredAlarm, LocalAlarmNotificationService, RegimenPaths, TokioTickScheduler,
    TomlSessionStore, TracingAnalytics, TracingHaptics,
};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Engine wired to the on-disk store plus the alarm feed.
struct Companion {
    engine: CompanionSessionEngine,
    alarms: mpsc::UnboundedReceiver<FiredAlarm>,
}

fn build(paths: &RegimenPaths) -> Result<Companion> {
    let config = ConfigService::new(paths)?
        .engine_config()
        .context("Failed to load config.toml")?;
    let store = TomlSessionStore::default_location(paths)?;
    let (notifications, alarms) = LocalAlarmNotificationService::with_listener();

    let services = CompanionServices {
        store: Arc::new(store),
        notifications: Arc::new(notifications),
        haptics: Arc::new(TracingHaptics),
        analytics: Arc::new(TracingAnalytics),
        clock: Arc::new(SystemClock),
        scheduler: Arc::new(TokioTickScheduler::new()),
    };
    let engine = CompanionSessionEngine::new(services, config);
    let on_error: ErrorCallback = Arc::new(|e: &RegimenError| eprintln!("  ! {}", e));
    engine.set_error_callback(on_error);

    Ok(Companion { engine, alarms })
}

/// Starts the routine in `routine_path` and walks through it.
pub async fn run(paths: &RegimenPaths, routine_path: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(routine_path)
        .await
        .with_context(|| format!("Failed to read routine file {}", routine_path.display()))?;
    let definition: RoutineDefinition = toml::from_str(&content)
        .with_context(|| format!("Invalid routine file {}", routine_path.display()))?;

    let companion = build(paths)?;
    println!(
        "{} ({} steps). Type ? for help.",
        definition.routine.name,
        definition.steps.len()
    );
    companion
        .engine
        .start_session(
            &definition.routine.id,
            &definition.routine.name,
            definition.ordered_steps(),
        )
        .await;

    drive(companion).await
}

/// Continues the saved unfinished session.
pub async fn resume(paths: &RegimenPaths) -> Result<()> {
    let companion = build(paths)?;
    if !companion.engine.resume_session().await {
        if let Some(e) = companion.engine.last_error() {
            return Err(e).context("Failed to load saved session");
        }
        println!("No unfinished session.");
        return Ok(());
    }
    drive(companion).await
}

/// Discards the saved unfinished session.
pub async fn abandon(paths: &RegimenPaths) -> Result<()> {
    let companion = build(paths)?;
    if companion.engine.resume_session().await {
        companion.engine.abandon_session().await;
        println!("Session discarded.");
    } else {
        println!("No unfinished session.");
    }
    Ok(())
}

async fn drive(companion: Companion) -> Result<()> {
    let Companion { engine, mut alarms } = companion;
    let mut states = engine.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let initial = *states.borrow_and_update();
    if show_state(&engine, initial).await {
        return Ok(());
    }

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                if show_state(&engine, state).await {
                    break;
                }
            }
            Some(alarm) = alarms.recv() => {
                println!("  * Time's up for {} ({}s)", alarm.step_title, alarm.seconds);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    tracing::debug!("[Cli] stdin closed");
                    break;
                };
                match Command::parse(&line) {
                    Some(Command::Quit) => {
                        println!("Progress saved. Continue with `regimen resume`.");
                        break;
                    }
                    Some(Command::Abandon) => {
                        engine.abandon_session().await;
                        println!("Session discarded.");
                        break;
                    }
                    Some(command) => apply(&engine, command).await,
                    None => println!("  Unknown command, ? for help"),
                }
            }
        }
    }

    Ok(())
}

async fn apply(engine: &CompanionSessionEngine, command: Command) {
    match command {
        Command::Next => engine.next_step().await,
        Command::Skip => engine.skip_step().await,
        Command::Timer => engine.show_timer().await,
        Command::StartTimer => engine.start_timer().await,
        Command::TogglePause => match engine.state() {
            SessionState::TimerRunning(_) => engine.pause_timer().await,
            SessionState::TimerPaused(_) => engine.resume_timer().await,
            _ => {}
        },
        Command::SkipTimer => engine.skip_timer().await,
        Command::Adjust(seconds) => {
            engine.adjust_timer(seconds).await;
            show_status(engine).await;
        }
        Command::Foreground => {
            engine.handle_foreground().await;
            show_status(engine).await;
        }
        Command::Status => show_status(engine).await,
        Command::Help => println!("{}", HELP),
        Command::Quit | Command::Abandon => {}
    }
}

/// Prints the screen for `state`. Returns true once the session is over.
async fn show_state(engine: &CompanionSessionEngine, state: SessionState) -> bool {
    let Some(session) = engine.session().await else {
        return state == SessionState::Idle;
    };

    match state {
        SessionState::Idle => return true,
        SessionState::StepIntro(i) => {
            if let Some(step) = session.steps.get(i) {
                println!();
                println!("[{}/{}] {}", i + 1, session.step_count(), step.title);
                println!("  {}", step.instruction);
                if let Some(wait) = step.wait_seconds.filter(|_| step.is_timed()) {
                    println!("  Wait {} (v to view timer, t to start)", format_seconds(wait));
                }
            }
        }
        SessionState::TimerIdle(i) => {
            if let Some(wait) = session.steps.get(i).and_then(|s| s.wait_seconds) {
                println!("  Timer ready: {} (t to start)", format_seconds(wait));
            }
        }
        SessionState::TimerRunning(_) => {
            println!("  Timer running: {} left", engine.timer().await.formatted_time());
        }
        SessionState::TimerPaused(_) => {
            println!("  Paused at {}", engine.timer().await.formatted_time());
        }
        SessionState::StepComplete(i) => {
            if let Some(step) = session.steps.get(i) {
                println!("  {} done. Press enter for the next step.", step.title);
            }
        }
        SessionState::RoutineComplete => {
            engine.complete_session().await;
            let duration = session.total_duration_seconds(SystemClock.now());
            println!();
            println!("{} complete!", session.routine_name);
            println!(
                "  {} of {} steps done, {} skipped, {}",
                session.steps_completed.len(),
                session.step_count(),
                session.skips,
                format_seconds(duration.max(0) as u32)
            );
            return true;
        }
    }
    false
}

async fn show_status(engine: &CompanionSessionEngine) {
    let Some(session) = engine.session().await else {
        println!("  No active session");
        return;
    };
    let timer = engine.timer().await;
    print!("  Step {}/{}", session.current_step_index + 1, session.step_count());
    if timer.is_running {
        print!(
            ", timer {}{}",
            timer.formatted_time(),
            if timer.is_paused { " (paused)" } else { "" }
        );
    }
    println!(", {:.0}% through", session.progress() * 100.0);
}

fn format_seconds(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
