use crate::domain::error::MaasLinkResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Envelope `type` used for client requests
pub const REQUEST_TYPE: i64 = 0;

/// Method of the application-level heartbeat probe
pub const PING_METHOD: &str = "ping";

/// Method of the heartbeat acknowledgement
pub const PONG_METHOD: &str = "pong";

/// Envelope `type` of a server-initiated reconnect notice
pub const RECONNECT_NOTICE_TYPE: &str = "reconnect";

/// Outbound request envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    /// RPC method name
    pub method: String,
    /// Envelope type, always [`REQUEST_TYPE`] for requests
    #[serde(rename = "type")]
    pub kind: i64,
    /// Client-chosen correlation token
    pub request_id: u64,
    /// Optional parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, request_id: u64) -> Self {
        Self {
            method: method.into(),
            kind: REQUEST_TYPE,
            request_id,
            params: None,
        }
    }

    pub fn with_params(mut self, params: Option<Value>) -> Self {
        self.params = params;
        self
    }

    /// Heartbeat probe correlated by the current wall-clock time in milliseconds
    pub fn ping() -> Self {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self::new(PING_METHOD, now_ms)
    }

    pub fn to_json(&self) -> MaasLinkResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Classification of one inbound text payload
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Heartbeat acknowledgement, consumed internally
    Pong,
    /// Server asks the client to re-register its subscriptions
    ReconnectNotice,
    /// Any other structured payload
    Data(Value),
    /// Payload that is not valid JSON
    Raw(String),
}

impl Inbound {
    /// Parse and classify a raw payload. Never fails: unparsable input is
    /// returned as [`Inbound::Raw`].
    pub fn classify(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(_) => return Inbound::Raw(raw.to_string()),
        };

        if value.get("method").and_then(Value::as_str) == Some(PONG_METHOD) {
            return Inbound::Pong;
        }
        if value.get("type").and_then(Value::as_str) == Some(RECONNECT_NOTICE_TYPE) {
            return Inbound::ReconnectNotice;
        }

        Inbound::Data(value)
    }

    /// Control messages never reach consumers
    pub fn is_control(&self) -> bool {
        matches!(self, Inbound::Pong | Inbound::ReconnectNotice)
    }
}

/// Most recent non-control payload, as exposed to consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LastMessage {
    Json(Value),
    Raw(String),
}

impl LastMessage {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            LastMessage::Json(value) => Some(value),
            LastMessage::Raw(_) => None,
        }
    }

    /// MAAS responses and notifications carry `method` or `name`
    pub fn method(&self) -> Option<&str> {
        let value = self.as_json()?;
        value
            .get("method")
            .or_else(|| value.get("name"))
            .and_then(Value::as_str)
    }
}

impl fmt::Display for LastMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastMessage::Json(value) => write!(f, "{}", value),
            LastMessage::Raw(raw) => write!(f, "{}", raw),
        }
    }
}
