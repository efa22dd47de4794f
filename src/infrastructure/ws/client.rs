use crate::core::communication::transport::{Connector, Link};
use crate::core::session::event::{ConnectionId, EventSender, SessionEvent};
use crate::core::session::state::{CLOSE_ABNORMAL, CLOSE_NORMAL, CLOSE_NO_STATUS};
use crate::domain::{
    config::SessionSettings,
    error::{MaasLinkError, MaasLinkResult},
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{
    self,
    client::IntoClientRequest,
    handshake::client::Request,
    http::{HeaderName, HeaderValue},
    protocol::{frame::coding::CloseCode, CloseFrame},
    Message,
};
use tokio_tungstenite::connect_async;
use tracing::{debug, error, info, warn};

/// How long a locally started close waits for the peer's close frame
const CLOSE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug)]
enum LinkCommand {
    Text(String),
    Close { code: u16, reason: String },
}

/// Opens WebSocket transports with tokio-tungstenite. Each transport runs
/// in its own task and reports through the session's event channel.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    fn open(
        &mut self,
        settings: &SessionSettings,
        connection: ConnectionId,
        events: EventSender,
    ) -> MaasLinkResult<Box<dyn Link>> {
        let request = build_request(settings)?;
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let connect_timeout = settings.connect_timeout();

        let task = tokio::spawn(run_link(
            request,
            connect_timeout,
            connection,
            events,
            commands_rx,
        ));

        Ok(Box::new(WsLink {
            connection,
            commands,
            _task: task,
        }))
    }
}

/// Handle to a transport task. Dropping it closes the command channel,
/// which makes the task close the socket and exit.
pub struct WsLink {
    connection: ConnectionId,
    commands: mpsc::UnboundedSender<LinkCommand>,
    _task: JoinHandle<()>,
}

impl Link for WsLink {
    fn send_text(&mut self, text: String) -> MaasLinkResult<()> {
        self.commands
            .send(LinkCommand::Text(text))
            .map_err(|_| MaasLinkError::NotConnected)
    }

    fn close(&mut self, code: u16, reason: &str) -> MaasLinkResult<()> {
        debug!("Closing connection #{} with code {}", self.connection, code);
        self.commands
            .send(LinkCommand::Close {
                code,
                reason: reason.to_string(),
            })
            .map_err(|_| MaasLinkError::NotConnected)
    }
}

/// Build the handshake request: target URL plus configured headers
/// (session cookie, origin and the like).
pub fn build_request(settings: &SessionSettings) -> MaasLinkResult<Request> {
    let mut request = settings
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| MaasLinkError::InvalidUrl {
            url: settings.url.clone(),
            reason: e.to_string(),
        })?;

    for (name, value) in &settings.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| MaasLinkError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| MaasLinkError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        request.headers_mut().insert(header_name, header_value);
    }

    Ok(request)
}

async fn run_link(
    request: Request,
    connect_timeout: Duration,
    connection: ConnectionId,
    events: EventSender,
    mut commands: mpsc::UnboundedReceiver<LinkCommand>,
) {
    let url = request.uri().to_string();

    // Connect with timeout
    let ws_stream = match timeout(connect_timeout, connect_async(request)).await {
        Ok(Ok((stream, response))) => {
            info!(
                "WebSocket connection #{} established to {} ({})",
                connection,
                url,
                response.status()
            );
            stream
        }
        Ok(Err(e)) => {
            let _ = events.send(SessionEvent::Failed {
                connection,
                reason: format!("Failed to connect to {}: {}", url, transport_error(e)),
            });
            return;
        }
        Err(_) => {
            let _ = events.send(SessionEvent::Failed {
                connection,
                reason: format!(
                    "{} connecting to {}",
                    MaasLinkError::Timeout(connect_timeout.as_millis() as u64),
                    url
                ),
            });
            return;
        }
    };

    if events.send(SessionEvent::Opened { connection }).is_err() {
        return;
    }

    let (mut sink, mut stream) = ws_stream.split();
    let mut commands_open = true;
    let mut local_close: Option<u16> = None;
    let mut peer_close: Option<(u16, String)> = None;

    let terminal = loop {
        tokio::select! {
            command = commands.recv(), if commands_open => match command {
                Some(LinkCommand::Text(text)) => {
                    let len = text.len();
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        let err = transport_error(e);
                        error!("Failed to write to connection #{}: {}", connection, err);
                        break SessionEvent::Failed { connection, reason: err.to_string() };
                    }
                    debug!("Sent {} bytes over WebSocket", len);
                }
                Some(LinkCommand::Close { code, reason }) => {
                    if local_close.is_some() {
                        continue;
                    }
                    local_close = Some(code);
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        warn!("Failed to send close frame on connection #{}: {}", connection, e);
                        break SessionEvent::Closed { connection, code, reason: String::new() };
                    }
                }
                None => {
                    commands_open = false;
                    if local_close.is_none() {
                        local_close = Some(CLOSE_NORMAL);
                        let _ = sink.send(Message::Close(None)).await;
                    }
                }
            },
            frame = next_frame(&mut stream, local_close.is_some()) => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(SessionEvent::Received {
                        connection,
                        payload: text.as_str().to_string(),
                    });
                }
                Some(Ok(Message::Binary(data))) => {
                    let _ = events.send(SessionEvent::Received {
                        connection,
                        payload: String::from_utf8_lossy(&data).into_owned(),
                    });
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    let _ = events.send(SessionEvent::Activity { connection });
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Received close frame on connection #{}: {:?}", connection, frame);
                    peer_close = Some(
                        frame
                            .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                            .unwrap_or((CLOSE_NO_STATUS, String::new())),
                    );
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    if peer_close.is_some() || local_close.is_some() {
                        break closed_event(connection, peer_close.take(), local_close);
                    }
                    break SessionEvent::Failed { connection, reason: transport_error(e).to_string() };
                }
                None => break closed_event(connection, peer_close.take(), local_close),
            },
        }
    };

    debug!("Connection #{} finished: {:?}", connection, terminal);
    let _ = events.send(terminal);
}

async fn next_frame<S>(stream: &mut S, closing: bool) -> Option<S::Item>
where
    S: futures_util::Stream + Unpin,
{
    if closing {
        timeout(CLOSE_GRACE, stream.next()).await.unwrap_or(None)
    } else {
        stream.next().await
    }
}

/// Socket-level I/O failures are network errors, the rest are protocol errors
fn transport_error(err: tungstenite::Error) -> MaasLinkError {
    match err {
        tungstenite::Error::Io(e) => MaasLinkError::Network(e),
        other => MaasLinkError::from(other),
    }
}

fn closed_event(
    connection: ConnectionId,
    peer_close: Option<(u16, String)>,
    local_close: Option<u16>,
) -> SessionEvent {
    let (code, reason) = match (peer_close, local_close) {
        (Some(close), _) => close,
        (None, Some(code)) => (code, String::new()),
        (None, None) => (CLOSE_ABNORMAL, String::new()),
    };
    SessionEvent::Closed {
        connection,
        code,
        reason,
    }
}
