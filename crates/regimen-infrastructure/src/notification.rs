//! Local alarm notifications backed by tokio timers.

use async_trait::async_trait;
use regimen_core::error::{RegimenError, Result};
use regimen_core::services::NotificationService;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// An alarm that went off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredAlarm {
    pub step_title: String,
    pub seconds: u32,
}

/// Schedules in-process alarms that fire after a delay.
///
/// Fired alarms are logged and, when a listener is attached, forwarded on an
/// unbounded channel so a terminal or desktop shell can surface them.
pub struct LocalAlarmNotificationService {
    pending: Mutex<Vec<JoinHandle<()>>>,
    listener: Option<mpsc::UnboundedSender<FiredAlarm>>,
}

impl LocalAlarmNotificationService {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            listener: None,
        }
    }

    /// Creates a service that forwards fired alarms to the returned receiver.
    pub fn with_listener() -> (Self, mpsc::UnboundedReceiver<FiredAlarm>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let service = Self {
            pending: Mutex::new(Vec::new()),
            listener: Some(sender),
        };
        (service, receiver)
    }

    /// Number of alarms scheduled and not yet fired or cancelled.
    pub async fn pending_count(&self) -> usize {
        let mut pending = self.pending.lock().await;
        pending.retain(|handle| !handle.is_finished());
        pending.len()
    }
}

impl Default for LocalAlarmNotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationService for LocalAlarmNotificationService {
    async fn schedule_timer_notification(&self, seconds: u32, step_title: &str) -> Result<()> {
        if seconds == 0 {
            return Err(RegimenError::notification("Alarm delay must be positive"));
        }

        let alarm = FiredAlarm {
            step_title: step_title.to_string(),
            seconds,
        };
        let listener = self.listener.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(seconds as u64)).await;
            tracing::info!(
                target: "notifications",
                "[Alarm] '{}' timer finished ({}s)",
                alarm.step_title,
                alarm.seconds
            );
            if let Some(listener) = listener {
                let _ = listener.send(alarm);
            }
        });

        let mut pending = self.pending.lock().await;
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
        tracing::debug!("[Alarm] Scheduled '{}' in {}s", step_title, seconds);
        Ok(())
    }

    async fn cancel_timer_notifications(&self) -> Result<()> {
        let mut pending = self.pending.lock().await;
        for handle in pending.drain(..) {
            handle.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_alarm_fires_after_delay() {
        let (service, mut fired) = LocalAlarmNotificationService::with_listener();
        service
            .schedule_timer_notification(90, "Clay mask")
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(89)).await;
        assert!(fired.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let alarm = fired.recv().await.unwrap();
        assert_eq!(alarm.step_title, "Clay mask");
        assert_eq!(service.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_alarm() {
        let (service, mut fired) = LocalAlarmNotificationService::with_listener();
        service.schedule_timer_notification(90, "Mask").await.unwrap();
        service.schedule_timer_notification(120, "Peel").await.unwrap();
        assert_eq!(service.pending_count().await, 2);

        service.cancel_timer_notifications().await.unwrap();
        tokio::time::sleep(Duration::from_secs(200)).await;

        assert!(fired.try_recv().is_err());
        assert_eq!(service.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_zero_delay_is_rejected() {
        let service = LocalAlarmNotificationService::new();
        let err = service
            .schedule_timer_notification(0, "Rinse")
            .await
            .unwrap_err();
        assert!(err.is_notification());
    }
}
