use crate::core::session::event::{EventSender, TimerId, TimerKind};
use crate::core::session::timer::TimerSlot;
use std::time::Duration;
use tracing::info;

/// Single-flight, constant-interval reconnect scheduler.
///
/// While a reconnect timer is pending, further `schedule` calls are no-ops.
/// Each tick asks the manager to `connect()`, whose own guard absorbs ticks
/// that arrive while an attempt is still opening. Retries are unbounded.
#[derive(Debug)]
pub struct ReconnectScheduler {
    slot: TimerSlot,
    delay: Duration,
}

impl ReconnectScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            slot: TimerSlot::new(TimerKind::Reconnect),
            delay,
        }
    }

    /// Start the periodic reconnect timer unless one is already pending.
    /// Returns whether a new timer was started.
    pub fn schedule(&mut self, events: &EventSender) -> bool {
        if self.slot.is_active() {
            return false;
        }
        self.slot.start_interval(self.delay, events);
        info!("Reconnect scheduled every {:?}", self.delay);
        true
    }

    pub fn cancel(&mut self) -> bool {
        self.slot.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_active()
    }

    pub fn accepts(&self, id: TimerId) -> bool {
        self.slot.accepts(id)
    }

    /// Number of reconnect timers ever started
    pub fn timers_started(&self) -> u64 {
        self.slot.started()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_schedule_is_single_flight() {
        let (events, _rx) = mpsc::unbounded_channel();
        let mut scheduler = ReconnectScheduler::new(Duration::from_secs(5));

        assert!(scheduler.schedule(&events));
        for _ in 0..10 {
            assert!(!scheduler.schedule(&events));
        }

        assert!(scheduler.is_pending());
        assert_eq!(scheduler.timers_started(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_then_reschedule() {
        let (events, _rx) = mpsc::unbounded_channel();
        let mut scheduler = ReconnectScheduler::new(Duration::from_secs(5));

        scheduler.schedule(&events);
        assert!(scheduler.cancel());
        assert!(!scheduler.is_pending());

        assert!(scheduler.schedule(&events));
        assert_eq!(scheduler.timers_started(), 2);
        assert_eq!(scheduler.delay(), Duration::from_secs(5));
    }
}
