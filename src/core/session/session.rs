use crate::core::communication::message::LastMessage;
use crate::core::session::event::SessionEvent;
use crate::core::session::state::ConnectionStatus;
use crate::domain::error::{MaasLinkError, MaasLinkResult};
use tokio::sync::{mpsc, watch};
use tracing::warn;

/// Consumer view of a running session.
///
/// Status and the last received message are observable values with
/// latest-value semantics. Sends and teardown are forwarded to the session
/// task as events.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: String,
    commands: mpsc::UnboundedSender<SessionEvent>,
    status: watch::Receiver<ConnectionStatus>,
    last_message: watch::Receiver<Option<LastMessage>>,
}

impl SessionHandle {
    pub(crate) fn new(
        session_id: String,
        commands: mpsc::UnboundedSender<SessionEvent>,
        status: watch::Receiver<ConnectionStatus>,
        last_message: watch::Receiver<Option<LastMessage>>,
    ) -> Self {
        Self {
            session_id,
            commands,
            status,
            last_message,
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

    /// Receiver notified on every status change
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Receiver notified whenever a non-control message arrives
    pub fn watch_messages(&self) -> watch::Receiver<Option<LastMessage>> {
        self.last_message.clone()
    }

    /// Best-effort send. Dropped (and logged) unless the session is connected.
    pub fn send_message(&self, payload: impl Into<String>) {
        if self
            .commands
            .send(SessionEvent::Outbound(payload.into()))
            .is_err()
        {
            warn!("Session '{}' has stopped. Message not sent", self.session_id);
        }
    }

    /// Tear the session down. Repeated calls are harmless.
    pub fn shutdown(&self) {
        let _ = self.commands.send(SessionEvent::Shutdown);
    }

    /// Wait until the session reports `wanted`
    pub async fn wait_for_status(&self, wanted: ConnectionStatus) -> MaasLinkResult<()> {
        let mut status = self.status.clone();
        status
            .wait_for(|current| *current == wanted)
            .await
            .map(|_| ())
            .map_err(|_| MaasLinkError::Session {
                message: format!("session '{}' stopped before reaching {}", self.session_id, wanted),
            })
    }
}
