use crate::domain::error::{MaasLinkError, MaasLinkResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// MaasLink configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaasLinkConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Session manager settings
    #[serde(default)]
    pub session: SessionSettings,
    /// Requests replayed after every (re)connection
    #[serde(default = "default_subscriptions")]
    pub subscriptions: Vec<SubscriptionConfig>,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Connection, reconnect and watchdog settings for one session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// WebSocket endpoint
    #[serde(default = "default_url")]
    pub url: String,
    /// Upper bound on the opening handshake in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Interval between reconnect attempts in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Watchdog period in milliseconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
    /// Idle duration after which the connection is force-closed
    #[serde(default = "default_max_idle")]
    pub max_idle_ms: u64,
    /// Send an application-level ping on every watchdog tick
    #[serde(default = "default_active_ping")]
    pub active_ping: bool,
    /// Delay before replaying subscriptions after a server reconnect notice
    #[serde(default = "default_resubscribe_delay")]
    pub resubscribe_delay_ms: u64,
    /// Close codes that do not trigger an automatic reconnect
    #[serde(default = "default_terminal_close_codes")]
    pub terminal_close_codes: Vec<u16>,
    /// Extra headers sent with the upgrade request (Cookie, Origin, ...)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// One outbound request of the initial subscription set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionConfig {
    /// RPC method name
    pub method: String,
    /// Optional request parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_url() -> String {
    "ws://localhost:8081/ws".to_string()
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_reconnect_delay() -> u64 {
    5_000
}

fn default_heartbeat_interval() -> u64 {
    30_000
}

fn default_max_idle() -> u64 {
    300_000
}

fn default_active_ping() -> bool {
    true
}

fn default_resubscribe_delay() -> u64 {
    2_000
}

fn default_terminal_close_codes() -> Vec<u16> {
    vec![1000]
}

/// The MAAS subscription set: current user, notifications, resource pools
/// and the first page of machines grouped by status.
pub fn default_subscriptions() -> Vec<SubscriptionConfig> {
    vec![
        SubscriptionConfig::new("user.auth_user"),
        SubscriptionConfig::new("notification.list"),
        SubscriptionConfig::new("resourcepool.list"),
        SubscriptionConfig::new("machine.list").with_params(serde_json::json!({
            "filter": {},
            "group_collapsed": [],
            "group_key": "status",
            "page_number": 1,
            "page_size": 50,
            "sort_direction": "ascending",
            "sort_key": "hostname"
        })),
    ]
}

impl Default for MaasLinkConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            session: SessionSettings::default(),
            subscriptions: default_subscriptions(),
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            connect_timeout_ms: default_connect_timeout(),
            reconnect_delay_ms: default_reconnect_delay(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            max_idle_ms: default_max_idle(),
            active_ping: default_active_ping(),
            resubscribe_delay_ms: default_resubscribe_delay(),
            terminal_close_codes: default_terminal_close_codes(),
            headers: BTreeMap::new(),
        }
    }
}

impl SessionSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn max_idle(&self) -> Duration {
        Duration::from_millis(self.max_idle_ms)
    }

    pub fn resubscribe_delay(&self) -> Duration {
        Duration::from_millis(self.resubscribe_delay_ms)
    }

    /// Reject settings the session manager cannot run with
    pub fn validate(&self) -> MaasLinkResult<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(MaasLinkError::Config {
                message: "session.url must not be empty".to_string(),
            });
        }
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(MaasLinkError::InvalidUrl {
                url: self.url.clone(),
                reason: "scheme must be ws or wss".to_string(),
            });
        }

        let periods = [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("reconnect_delay_ms", self.reconnect_delay_ms),
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("max_idle_ms", self.max_idle_ms),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(MaasLinkError::Config {
                    message: format!("session.{} must be greater than zero", name),
                });
            }
        }

        Ok(())
    }
}

impl SubscriptionConfig {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }
}
