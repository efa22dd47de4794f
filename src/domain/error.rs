use thiserror::Error;

/// MaasLink unified error type
#[derive(Error, Debug)]
pub enum MaasLinkError {
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid handshake header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Connection timeout after {0}ms")]
    Timeout(u64),

    #[error("Session not connected")]
    NotConnected,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for MaasLinkError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

pub type MaasLinkResult<T> = Result<T, MaasLinkError>;
