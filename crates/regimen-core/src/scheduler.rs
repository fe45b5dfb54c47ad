//! Periodic tick scheduling.
//!
//! The companion countdown is driven by a repeating callback. Schedulers are
//! injected so tests can fire ticks from a virtual clock instead of waiting on
//! real time.

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What a tick callback wants the scheduler to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Callback invoked on every tick.
pub type TickFn = Arc<dyn Fn() -> BoxFuture<'static, TickControl> + Send + Sync>;

/// Schedules repeating ticks.
pub trait TickScheduler: Send + Sync {
    /// Starts invoking `tick` every `interval` until the returned handle is
    /// cancelled (or dropped) or the callback returns `TickControl::Stop`.
    ///
    /// Implementations must not invoke `tick` once the handle's token is
    /// cancelled.
    fn schedule(&self, interval: Duration, tick: TickFn) -> TickHandle;
}

/// Cancellation handle for a scheduled tick loop.
///
/// Cancelling is idempotent, and dropping the handle cancels the loop.
#[derive(Debug)]
pub struct TickHandle {
    token: CancellationToken,
}

impl TickHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_cancels_token() {
        let token = CancellationToken::new();
        let observer = token.clone();
        {
            let handle = TickHandle::new(token);
            assert!(!handle.is_cancelled());
        }
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let handle = TickHandle::new(CancellationToken::new());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}
