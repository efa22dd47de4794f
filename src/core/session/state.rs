use serde::{Deserialize, Serialize};

/// Normal, intentional closure
pub const CLOSE_NORMAL: u16 = 1000;
/// Endpoint going away (also used by servers for idle timeouts)
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Protocol violation, e.g. an unsolicited ping rejected by the server
pub const CLOSE_PROTOCOL_ERROR: u16 = 1002;
/// Close frame without a status code
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Transport dropped without a close frame
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Reason attached to a watchdog-initiated close
pub const IDLE_TIMEOUT_REASON: &str = "Idle timeout";

/// Connection status exposed to consumers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No transport, or the last one closed
    #[default]
    Disconnected,
    /// A transport is being opened
    Connecting,
    /// The transport is open
    Connected,
    /// The last attempt failed at transport level
    Error,
}

impl ConnectionStatus {
    /// A connection exists and is either opening or open
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionStatus::Connecting | ConnectionStatus::Connected)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error => write!(f, "error"),
        }
    }
}

/// Watchdog state: active only while connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchdogState {
    #[default]
    Inactive,
    Active,
}

/// Decides whether a close event is followed by an automatic reconnect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosePolicy {
    terminal_codes: Vec<u16>,
}

impl ClosePolicy {
    pub fn new(terminal_codes: Vec<u16>) -> Self {
        Self { terminal_codes }
    }

    /// Terminal codes end the session unless the close was forced by the
    /// idle watchdog; every other code reconnects.
    pub fn should_reconnect(&self, code: u16, idle_forced: bool) -> bool {
        idle_forced || !self.terminal_codes.contains(&code)
    }

    pub fn terminal_codes(&self) -> &[u16] {
        &self.terminal_codes
    }
}

impl Default for ClosePolicy {
    fn default() -> Self {
        Self::new(vec![CLOSE_NORMAL])
    }
}

/// Session counters, for diagnostics only
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStats {
    /// Times `connect` actually started a transport
    pub connect_attempts: u64,
    /// Successful open transitions
    pub opens: u64,
    /// Inbound payloads of any kind
    pub messages_received: u64,
    /// Inbound pong and reconnect notices
    pub control_messages: u64,
    /// Payloads handed to the transport
    pub messages_sent: u64,
    /// Payloads dropped because the session was not connected
    pub dropped_sends: u64,
    /// Closes forced by the idle watchdog
    pub idle_closes: u64,
}
