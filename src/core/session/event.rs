use tokio::sync::mpsc;

/// Identity of one transport instance; a reconnect always gets a new one
pub type ConnectionId = u64;

/// Sender half used by transports and timers to post events to the manager
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Identity of one started timer within its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// The timers a session owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Reconnect,
    Heartbeat,
    Resubscribe,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerKind::Reconnect => write!(f, "reconnect"),
            TimerKind::Heartbeat => write!(f, "heartbeat"),
            TimerKind::Resubscribe => write!(f, "resubscribe"),
        }
    }
}

/// Everything that can change session state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The transport finished its opening handshake
    Opened { connection: ConnectionId },
    /// A text (or UTF-8 decoded binary) payload arrived
    Received {
        connection: ConnectionId,
        payload: String,
    },
    /// Transport-level traffic that carries no payload (ping/pong frames)
    Activity { connection: ConnectionId },
    /// The transport failed; no further events follow for this connection
    Failed {
        connection: ConnectionId,
        reason: String,
    },
    /// The transport closed; no further events follow for this connection
    Closed {
        connection: ConnectionId,
        code: u16,
        reason: String,
    },
    /// A timer fired
    Timer { kind: TimerKind, id: TimerId },
    /// A consumer asked to send a payload
    Outbound(String),
    /// Tear the session down
    Shutdown,
}

impl SessionEvent {
    /// Connection the event belongs to, for transport events
    pub fn connection(&self) -> Option<ConnectionId> {
        match self {
            SessionEvent::Opened { connection }
            | SessionEvent::Received { connection, .. }
            | SessionEvent::Activity { connection }
            | SessionEvent::Failed { connection, .. }
            | SessionEvent::Closed { connection, .. } => Some(*connection),
            _ => None,
        }
    }
}
