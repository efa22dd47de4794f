//! maas-link library
//!
//! Resilient WebSocket session management for MAAS clients: single-flight
//! reconnects, an idle watchdog and subscription replay after every
//! (re)connection.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use domain::error::{MaasLinkError, MaasLinkResult};
pub use domain::config::{MaasLinkConfig, SessionSettings, SubscriptionConfig};
pub use core::communication::{Connector, LastMessage, Link};
pub use core::session::{ConnectionStatus, SessionEvent, SessionHandle, SessionManager, SubscriptionSet};
pub use infrastructure::ws::WsConnector;
