//! Tokio-backed periodic tick scheduler.

use regimen_core::scheduler::{TickControl, TickFn, TickHandle, TickScheduler};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval_at, Instant};
use tokio_util::sync::CancellationToken;

/// Drives ticks from a spawned tokio task.
///
/// The first tick fires one `interval` after scheduling. Missed ticks are
/// delayed rather than burst, since the engine reconciles lost time from the
/// wall clock anyway.
#[derive(Debug, Clone, Default)]
pub struct TokioTickScheduler;

impl TokioTickScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl TickScheduler for TokioTickScheduler {
    fn schedule(&self, period: Duration, tick: TickFn) -> TickHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if cancelled.is_cancelled() {
                    break;
                }
                if tick().await == TickControl::Stop {
                    tracing::debug!("[TickScheduler] Tick loop stopped by callback");
                    break;
                }
            }
        });

        TickHandle::new(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_tick(count: Arc<AtomicU32>, stop_after: u32) -> TickFn {
        Arc::new(move || {
            let count = count.clone();
            async move {
                let n = count.fetch_add(1, Ordering::SeqCst) + 1;
                if n >= stop_after {
                    TickControl::Stop
                } else {
                    TickControl::Continue
                }
            }
            .boxed()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_stop() {
        let count = Arc::new(AtomicU32::new(0));
        let _handle = TokioTickScheduler::new()
            .schedule(Duration::from_secs(1), counting_tick(count.clone(), 3));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let count = Arc::new(AtomicU32::new(0));
        let handle = TokioTickScheduler::new()
            .schedule(Duration::from_secs(1), counting_tick(count.clone(), u32::MAX));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        handle.cancel();
        let seen = count.load(Ordering::SeqCst);
        assert_eq!(seen, 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }
}
