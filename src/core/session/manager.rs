//! Resilient WebSocket session manager.
//!
//! The manager owns one connection at a time, the reconnect scheduler, the
//! idle watchdog and the subscription replay. Every input is a
//! [`SessionEvent`] handled to completion by [`SessionManager::handle_event`];
//! transports and timers only post events, they never touch state.

use crate::core::communication::message::{Inbound, LastMessage, Request};
use crate::core::communication::transport::{Connector, Link};
use crate::core::session::event::{ConnectionId, EventSender, SessionEvent, TimerId, TimerKind};
use crate::core::session::heartbeat::{HeartbeatAction, IdleWatchdog};
use crate::core::session::reconnect::ReconnectScheduler;
use crate::core::session::session::SessionHandle;
use crate::core::session::state::{
    ClosePolicy, ConnectionStatus, SessionStats, WatchdogState, CLOSE_NORMAL, IDLE_TIMEOUT_REASON,
};
use crate::core::session::subscriptions::SubscriptionSet;
use crate::core::session::timer::TimerSlot;
use crate::domain::config::SessionSettings;
use crate::domain::error::MaasLinkResult;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

/// Reason sent when the owning context tears the session down
const SHUTDOWN_REASON: &str = "Session closed";

struct ActiveConnection {
    id: ConnectionId,
    link: Box<dyn Link>,
}

pub struct SessionManager<C: Connector> {
    session_id: String,
    settings: SessionSettings,
    connector: C,
    events: EventSender,
    connection: Option<ActiveConnection>,
    next_connection_id: ConnectionId,
    status: watch::Sender<ConnectionStatus>,
    last_message: watch::Sender<Option<LastMessage>>,
    last_activity: Instant,
    reconnect: ReconnectScheduler,
    watchdog: IdleWatchdog,
    resubscribe: TimerSlot,
    subscriptions: SubscriptionSet,
    close_policy: ClosePolicy,
    /// Set when the watchdog forces a close, consumed by the next close event
    idle_closed: bool,
    shut_down: bool,
    stats: SessionStats,
}

impl<C: Connector> SessionManager<C> {
    /// Create a manager and the receiver its transports and timers post to.
    /// Nothing is opened until [`connect`](Self::connect) is called.
    /// Settings are validated first; timer periods must be non-zero.
    pub fn new(
        settings: SessionSettings,
        subscriptions: SubscriptionSet,
        connector: C,
    ) -> MaasLinkResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        settings.validate()?;

        let (events, events_rx) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        let (last_message, _) = watch::channel(None);

        let manager = Self {
            session_id: format!("ws_{}", uuid::Uuid::new_v4().simple()),
            reconnect: ReconnectScheduler::new(settings.reconnect_delay()),
            watchdog: IdleWatchdog::new(
                settings.heartbeat_interval(),
                settings.max_idle(),
                settings.active_ping,
            ),
            resubscribe: TimerSlot::new(TimerKind::Resubscribe),
            close_policy: ClosePolicy::new(settings.terminal_close_codes.clone()),
            settings,
            connector,
            events,
            connection: None,
            next_connection_id: 0,
            status,
            last_message,
            last_activity: Instant::now(),
            subscriptions,
            idle_closed: false,
            shut_down: false,
            stats: SessionStats::default(),
        };

        Ok((manager, events_rx))
    }

    /// Start a session on the current runtime and return its consumer
    /// handle. The session connects immediately and runs until
    /// [`SessionHandle::shutdown`] is called or every handle is dropped.
    pub fn spawn(
        settings: SessionSettings,
        subscriptions: SubscriptionSet,
        connector: C,
    ) -> MaasLinkResult<SessionHandle> {
        let (manager, events) = Self::new(settings, subscriptions, connector)?;
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(
            manager.session_id.clone(),
            commands,
            manager.status.subscribe(),
            manager.last_message.subscribe(),
        );

        let span = tracing::info_span!("session", id = %manager.session_id);
        tokio::spawn(manager.run(events, commands_rx).instrument(span));

        Ok(handle)
    }

    /// Drive the manager: connect, then handle events until teardown.
    /// A closed command channel counts as teardown of the owning context.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        mut commands: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        info!("Session '{}' starting for {}", self.session_id, self.settings.url);
        self.connect();

        while !self.shut_down {
            let event = tokio::select! {
                Some(event) = events.recv() => event,
                command = commands.recv() => command.unwrap_or(SessionEvent::Shutdown),
            };
            self.handle_event(event);
        }

        info!("Session '{}' stopped", self.session_id);
    }

    /// Single entry point for every state transition
    pub fn handle_event(&mut self, event: SessionEvent) {
        if self.shut_down {
            debug!("Session shut down, ignoring {:?}", event);
            return;
        }

        if let Some(connection) = event.connection() {
            if self.connection_id() != Some(connection) {
                debug!("Ignoring event for stale connection #{}", connection);
                return;
            }
        }

        match event {
            SessionEvent::Opened { .. } => self.on_open(),
            SessionEvent::Received { payload, .. } => self.on_receive(payload),
            SessionEvent::Activity { .. } => self.last_activity = Instant::now(),
            SessionEvent::Failed { reason, .. } => self.on_error(&reason),
            SessionEvent::Closed { code, reason, .. } => self.on_close(code, &reason),
            SessionEvent::Timer { kind, id } => self.on_timer(kind, id),
            SessionEvent::Outbound(payload) => {
                self.send_message(&payload);
            }
            SessionEvent::Shutdown => self.teardown(),
        }
    }

    /// Open a transport unless one is already open or opening
    pub fn connect(&mut self) {
        if self.shut_down {
            return;
        }
        if self.connection.is_some() && self.status().is_live() {
            debug!("WebSocket already connected or connecting");
            return;
        }

        self.next_connection_id += 1;
        let id = self.next_connection_id;
        self.stats.connect_attempts += 1;
        self.set_status(ConnectionStatus::Connecting);
        info!(
            "Attempting to connect to WebSocket: {} (attempt {}, connection #{})",
            self.settings.url, self.stats.connect_attempts, id
        );

        match self.connector.open(&self.settings, id, self.events.clone()) {
            Ok(link) => {
                self.connection = Some(ActiveConnection { id, link });
            }
            Err(e) => {
                error!("Failed to create WebSocket: {}", e);
                self.connection = None;
                self.set_status(ConnectionStatus::Error);
                self.reconnect.schedule(&self.events);
            }
        }
    }

    /// Best-effort send: only while connected, never queued. Nothing goes out
    /// once the watchdog has started closing the connection.
    /// Returns whether the payload was handed to the transport.
    pub fn send_message(&mut self, payload: &str) -> bool {
        let connected = self.status() == ConnectionStatus::Connected && !self.idle_closed;
        let connection = match self.connection.as_mut() {
            Some(connection) if connected => connection,
            _ => {
                warn!("WebSocket is not open. Message not sent: {}", payload);
                self.stats.dropped_sends += 1;
                return false;
            }
        };

        match connection.link.send_text(payload.to_string()) {
            Ok(()) => {
                debug!("Sent {} bytes on connection #{}", payload.len(), connection.id);
                self.stats.messages_sent += 1;
                true
            }
            Err(e) => {
                warn!("Failed to send message on connection #{}: {}", connection.id, e);
                self.stats.dropped_sends += 1;
                false
            }
        }
    }

    /// Replay the subscription set, in order, if connected
    pub fn send_initial_messages(&mut self) {
        if self.status() != ConnectionStatus::Connected {
            warn!("WebSocket not connected, skipping initial subscription messages");
            return;
        }

        info!("Sending {} initial subscription messages", self.subscriptions.len());
        let payloads = self.subscriptions.payloads().to_vec();
        for payload in &payloads {
            self.send_message(payload);
        }
    }

    /// Cancel every timer and close the connection. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.reconnect.cancel();
        self.watchdog.stop();
        self.resubscribe.cancel();

        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.link.close(CLOSE_NORMAL, SHUTDOWN_REASON) {
                debug!("Close on teardown failed for connection #{}: {}", connection.id, e);
            }
        }

        self.set_status(ConnectionStatus::Disconnected);
        info!("Session '{}' torn down", self.session_id);
    }

    fn on_open(&mut self) {
        info!("WebSocket connected!");
        self.set_status(ConnectionStatus::Connected);
        self.last_activity = Instant::now();
        self.idle_closed = false;
        self.stats.opens += 1;
        if self.reconnect.cancel() {
            debug!("Reconnect timer cancelled after successful open");
        }
        self.send_initial_messages();
        self.watchdog.start(&self.events);
    }

    fn on_receive(&mut self, payload: String) {
        self.last_activity = Instant::now();
        self.stats.messages_received += 1;

        match Inbound::classify(&payload) {
            Inbound::Pong => {
                debug!("Pong received");
                self.stats.control_messages += 1;
            }
            Inbound::ReconnectNotice => {
                info!(
                    "Server reconnect notice, resubscribing in {:?}",
                    self.settings.resubscribe_delay()
                );
                self.stats.control_messages += 1;
                self.resubscribe
                    .start_once(self.settings.resubscribe_delay(), &self.events);
            }
            Inbound::Data(value) => {
                self.last_message.send_replace(Some(LastMessage::Json(value)));
            }
            Inbound::Raw(raw) => {
                warn!("Failed to parse WebSocket message, keeping raw payload: {}", raw);
                self.last_message.send_replace(Some(LastMessage::Raw(raw)));
            }
        }
    }

    fn on_error(&mut self, reason: &str) {
        error!("WebSocket error: {}", reason);
        self.connection = None;
        self.idle_closed = false;
        self.watchdog.stop();
        self.resubscribe.cancel();
        self.set_status(ConnectionStatus::Error);
        self.reconnect.schedule(&self.events);
    }

    fn on_close(&mut self, code: u16, reason: &str) {
        warn!("WebSocket disconnected: {} {}", code, reason);
        self.connection = None;
        self.watchdog.stop();
        self.resubscribe.cancel();
        self.set_status(ConnectionStatus::Disconnected);

        let idle_forced = std::mem::take(&mut self.idle_closed);
        if self.close_policy.should_reconnect(code, idle_forced) {
            self.reconnect.schedule(&self.events);
        } else {
            info!("Normal closure (code {}), not reconnecting", code);
        }
    }

    fn on_timer(&mut self, kind: TimerKind, id: TimerId) {
        match kind {
            TimerKind::Reconnect if self.reconnect.accepts(id) => self.connect(),
            TimerKind::Heartbeat if self.watchdog.accepts(id) => self.on_heartbeat_tick(),
            TimerKind::Resubscribe if self.resubscribe.accepts(id) => {
                self.resubscribe.complete(id);
                self.send_initial_messages();
            }
            _ => debug!("Ignoring tick from cancelled {} timer #{}", kind, id.0),
        }
    }

    fn on_heartbeat_tick(&mut self) {
        match self.watchdog.evaluate(self.last_activity, Instant::now()) {
            HeartbeatAction::CloseIdle { idle } => {
                warn!("WebSocket idle for {:?}. Closing to reconnect", idle);
                self.stats.idle_closes += 1;
                self.idle_closed = true;
                self.watchdog.stop();
                if let Some(connection) = self.connection.as_mut() {
                    if let Err(e) = connection.link.close(CLOSE_NORMAL, IDLE_TIMEOUT_REASON) {
                        warn!("Failed to close idle connection #{}: {}", connection.id, e);
                    }
                }
            }
            HeartbeatAction::SendPing => match Request::ping().to_json() {
                Ok(ping) => {
                    self.send_message(&ping);
                }
                Err(e) => error!("Failed to encode ping: {}", e),
            },
            HeartbeatAction::Continue => {}
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!("Connection status {} -> {}", previous, status);
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn last_message(&self) -> Option<LastMessage> {
        self.last_message.borrow().clone()
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.as_ref().map(|connection| connection.id)
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect.is_pending()
    }

    pub fn reconnect_timers_started(&self) -> u64 {
        self.reconnect.timers_started()
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        self.watchdog.state()
    }

    pub fn resubscribe_pending(&self) -> bool {
        self.resubscribe.is_active()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }
}
