use crate::core::session::event::{EventSender, TimerId, TimerKind};
use crate::core::session::state::WatchdogState;
use crate::core::session::timer::TimerSlot;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// What the watchdog wants done on a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Idle for longer than allowed: force-close the connection
    CloseIdle { idle: Duration },
    /// Send an application-level ping
    SendPing,
    /// Nothing to do
    Continue,
}

/// Periodic idle watchdog with optional active ping.
///
/// Some servers reject unsolicited pings with a protocol-error close, so
/// pinging can be switched off, leaving idle detection only.
#[derive(Debug)]
pub struct IdleWatchdog {
    slot: TimerSlot,
    interval: Duration,
    max_idle: Duration,
    active_ping: bool,
}

impl IdleWatchdog {
    pub fn new(interval: Duration, max_idle: Duration, active_ping: bool) -> Self {
        Self {
            slot: TimerSlot::new(TimerKind::Heartbeat),
            interval,
            max_idle,
            active_ping,
        }
    }

    /// `Inactive -> Active`; restarting replaces the previous timer
    pub fn start(&mut self, events: &EventSender) {
        self.slot.start_interval(self.interval, events);
    }

    /// `Active -> Inactive`
    pub fn stop(&mut self) {
        if self.slot.cancel() {
            debug!("Heartbeat watchdog stopped");
        }
    }

    pub fn state(&self) -> WatchdogState {
        if self.slot.is_active() {
            WatchdogState::Active
        } else {
            WatchdogState::Inactive
        }
    }

    pub fn accepts(&self, id: TimerId) -> bool {
        self.slot.accepts(id)
    }

    /// Decide the action for a tick at `now`
    pub fn evaluate(&self, last_activity: Instant, now: Instant) -> HeartbeatAction {
        let idle = now.saturating_duration_since(last_activity);
        if idle > self.max_idle {
            return HeartbeatAction::CloseIdle { idle };
        }
        if self.active_ping {
            HeartbeatAction::SendPing
        } else {
            HeartbeatAction::Continue
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_idle(&self) -> Duration {
        self.max_idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn watchdog(active_ping: bool) -> IdleWatchdog {
        IdleWatchdog::new(
            Duration::from_secs(30),
            Duration::from_secs(300),
            active_ping,
        )
    }

    #[test]
    fn test_idle_past_threshold_closes() {
        let watchdog = watchdog(true);
        let t0 = Instant::now();
        let now = t0 + Duration::from_secs(300) + Duration::from_millis(1);

        assert_eq!(
            watchdog.evaluate(t0, now),
            HeartbeatAction::CloseIdle {
                idle: Duration::from_millis(300_001)
            }
        );
    }

    #[test]
    fn test_idle_at_threshold_does_not_close() {
        let watchdog = watchdog(true);
        let t0 = Instant::now();

        assert_eq!(
            watchdog.evaluate(t0, t0 + Duration::from_secs(300)),
            HeartbeatAction::SendPing
        );
    }

    #[test]
    fn test_idle_detection_only() {
        let watchdog = watchdog(false);
        let t0 = Instant::now();

        assert_eq!(
            watchdog.evaluate(t0, t0 + Duration::from_secs(10)),
            HeartbeatAction::Continue
        );
        assert!(matches!(
            watchdog.evaluate(t0, t0 + Duration::from_secs(301)),
            HeartbeatAction::CloseIdle { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions() {
        let (events, _rx) = mpsc::unbounded_channel();
        let mut watchdog = watchdog(true);

        assert_eq!(watchdog.state(), WatchdogState::Inactive);
        watchdog.start(&events);
        assert_eq!(watchdog.state(), WatchdogState::Active);
        watchdog.stop();
        assert_eq!(watchdog.state(), WatchdogState::Inactive);
        watchdog.stop();
        assert_eq!(watchdog.state(), WatchdogState::Inactive);
    }
}
