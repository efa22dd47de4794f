use crate::core::session::event::{ConnectionId, EventSender};
use crate::domain::{config::SessionSettings, error::MaasLinkResult};

/// Outbound half of one open (or opening) transport.
///
/// Implementations must not block: sends and closes are handed to the task
/// that owns the socket. Dropping the link shuts the transport down, but it
/// may still report a final `Closed` for its connection. The manager treats
/// events for a connection it no longer holds as stale and ignores them.
pub trait Link: Send {
    /// Queue a text frame
    fn send_text(&mut self, text: String) -> MaasLinkResult<()>;

    /// Start a close handshake. The outcome arrives later as a `Closed`
    /// event for this connection.
    fn close(&mut self, code: u16, reason: &str) -> MaasLinkResult<()>;
}

/// Opens transports on behalf of the session manager.
///
/// `open` returns immediately. Completion is reported asynchronously on
/// `events` as exactly one of `Opened` or `Failed`, followed (after
/// `Opened`) by any number of `Received`/`Activity` events and exactly one
/// terminal `Failed` or `Closed`, all tagged with `connection`.
/// An `Err` return means the transport could not even be constructed.
pub trait Connector: Send + 'static {
    fn open(
        &mut self,
        settings: &SessionSettings,
        connection: ConnectionId,
        events: EventSender,
    ) -> MaasLinkResult<Box<dyn Link>>;
}
