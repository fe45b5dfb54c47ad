use regimen_application::{CompanionServices, CompanionSessionEngine};
use regimen_core::clock::SystemClock;
use regimen_core::companion::{CompanionStep, SessionState, SessionStore};
use regimen_core::config::EngineConfig;
use regimen_infrastructure::{
    InMemorySessionStore, LocalAlarmNotificationService, TokioTickScheduler, TomlSessionStore,
    TracingAnalytics, TracingHaptics,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn engine_with(
    store: Arc<dyn SessionStore>,
    notifications: Arc<LocalAlarmNotificationService>,
) -> CompanionSessionEngine {
    let services = CompanionServices {
        store,
        notifications,
        haptics: Arc::new(TracingHaptics),
        analytics: Arc::new(TracingAnalytics),
        clock: Arc::new(SystemClock),
        scheduler: Arc::new(TokioTickScheduler::new()),
    };
    CompanionSessionEngine::new(services, EngineConfig::default())
}

fn single_timed_step(wait_seconds: u32) -> Vec<CompanionStep> {
    vec![CompanionStep::timed("toner", 0, "Toner", "Pat until absorbed", wait_seconds)]
}

#[tokio::test(start_paused = true)]
async fn test_countdown_finishes_on_tokio_ticks() {
    let engine = engine_with(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(LocalAlarmNotificationService::new()),
    );
    engine.start_session("am", "Morning", single_timed_step(45)).await;
    engine.start_timer().await;

    tokio::time::sleep(Duration::from_millis(20_500)).await;
    assert_eq!(engine.state(), SessionState::TimerRunning(0));
    assert_eq!(engine.timer().await.remaining_seconds, 25);

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(engine.state(), SessionState::StepComplete(0));
    assert_eq!(engine.timer().await.remaining_seconds, 0);
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_countdown_and_cancels_alarm() {
    let (alarms, mut fired) = LocalAlarmNotificationService::with_listener();
    let alarms = Arc::new(alarms);
    let engine = engine_with(Arc::new(InMemorySessionStore::new()), alarms.clone());

    engine.start_session("pm", "Evening", single_timed_step(90)).await;
    engine.start_timer().await;
    assert_eq!(alarms.pending_count().await, 1);

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    engine.pause_timer().await;
    assert_eq!(engine.timer().await.remaining_seconds, 80);
    assert_eq!(alarms.pending_count().await, 0);

    // Well past when the first alarm was due
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(engine.timer().await.remaining_seconds, 80);
    assert!(fired.try_recv().is_err());

    engine.resume_timer().await;
    assert_eq!(alarms.pending_count().await, 1);
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    assert_eq!(engine.timer().await.remaining_seconds, 75);

    engine.skip_timer().await;
    assert_eq!(engine.state(), SessionState::StepComplete(0));
    assert_eq!(alarms.pending_count().await, 0);
}

#[tokio::test]
async fn test_completed_routine_lands_in_history_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(TomlSessionStore::new(temp_dir.path()).unwrap());
    let engine = engine_with(store.clone(), Arc::new(LocalAlarmNotificationService::new()));

    let steps = vec![
        CompanionStep::instruction("cleanse", 0, "Cleanse", "Rinse"),
        CompanionStep::timed("serum", 1, "Serum", "Wait", 30),
        CompanionStep::instruction("spf", 2, "Sunscreen", "Apply"),
    ];
    engine.start_session("am", "Morning", steps).await;
    engine.next_step().await;
    engine.skip_step().await;
    engine.next_step().await;
    assert_eq!(engine.state(), SessionState::RoutineComplete);

    engine.complete_session().await;
    assert!(engine.last_error().is_none());

    let reopened = TomlSessionStore::new(temp_dir.path()).unwrap();
    let history = reopened.completed_sessions().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].skips, 1);
    assert_eq!(history[0].steps_completed.len(), 2);
    assert!(reopened.resume_session().await.unwrap().is_none());
}
