//! Owned, cancellable timers.
//!
//! A timer is a spawned task that posts [`SessionEvent::Timer`] to the
//! session's event channel. The handle aborts the task when dropped, so a
//! timer lives exactly as long as the slot that owns it.

use crate::core::session::event::{EventSender, SessionEvent, TimerId, TimerKind};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to one running timer task
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Fire every `period`, first tick one period from now
    pub fn interval(kind: TimerKind, id: TimerId, period: Duration, events: EventSender) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(SessionEvent::Timer { kind, id }).is_err() {
                    break;
                }
            }
        });
        Self { id, task }
    }

    /// Fire once after `delay`
    pub fn once(kind: TimerKind, id: TimerId, delay: Duration, events: EventSender) -> Self {
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = events.send(SessionEvent::Timer { kind, id });
        });
        Self { id, task }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Holds at most one timer of a given kind. Starting a timer always cancels
/// the previous one first.
#[derive(Debug)]
pub struct TimerSlot {
    kind: TimerKind,
    current: Option<TimerHandle>,
    next_id: u64,
}

impl TimerSlot {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            current: None,
            next_id: 0,
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Number of timers this slot has ever started
    pub fn started(&self) -> u64 {
        self.next_id
    }

    pub fn start_interval(&mut self, period: Duration, events: &EventSender) -> TimerId {
        self.cancel();
        let id = self.allocate();
        self.current = Some(TimerHandle::interval(self.kind, id, period, events.clone()));
        debug!("Started {} timer #{} every {:?}", self.kind, id.0, period);
        id
    }

    pub fn start_once(&mut self, delay: Duration, events: &EventSender) -> TimerId {
        self.cancel();
        let id = self.allocate();
        self.current = Some(TimerHandle::once(self.kind, id, delay, events.clone()));
        debug!("Started {} timer #{} in {:?}", self.kind, id.0, delay);
        id
    }

    /// Cancel the running timer; returns whether one was running
    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some(handle) => {
                debug!("Cancelled {} timer #{}", self.kind, handle.id().0);
                true
            }
            None => false,
        }
    }

    /// Whether a tick with `id` comes from the running timer. Ticks already
    /// queued by a cancelled timer are rejected here.
    pub fn accepts(&self, id: TimerId) -> bool {
        self.current.as_ref().map(TimerHandle::id) == Some(id)
    }

    /// Release a one-shot timer after its tick has been handled
    pub fn complete(&mut self, id: TimerId) {
        if self.accepts(id) {
            self.current = None;
        }
    }

    fn allocate(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticks_after_first_period() {
        let (events, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new(TimerKind::Heartbeat);
        let start = Instant::now();

        let id = slot.start_interval(Duration::from_secs(30), &events);

        for n in 1..=3u32 {
            let event = rx.recv().await.unwrap();
            assert_eq!(
                event,
                SessionEvent::Timer {
                    kind: TimerKind::Heartbeat,
                    id
                }
            );
            assert_eq!(start.elapsed(), Duration::from_secs(30) * n);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_timer() {
        let (events, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new(TimerKind::Resubscribe);

        let first = slot.start_once(Duration::from_secs(2), &events);
        let second = slot.start_once(Duration::from_secs(2), &events);

        assert_ne!(first, second);
        assert!(!slot.accepts(first));
        assert!(slot.accepts(second));
        assert_eq!(slot.started(), 2);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            SessionEvent::Timer {
                kind: TimerKind::Resubscribe,
                id: second
            }
        );

        slot.complete(second);
        assert!(!slot.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (events, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new(TimerKind::Reconnect);

        slot.start_interval(Duration::from_secs(5), &events);
        assert!(slot.cancel());
        assert!(!slot.cancel());

        time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }
}
