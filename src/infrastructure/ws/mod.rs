// WebSocket transport
pub mod client;

pub use client::{build_request, WsConnector, WsLink};
