use crate::cli::args::OutputFormat;
use crate::core::communication::LastMessage;
use crate::core::session::ConnectionStatus;
use crate::domain::config::MaasLinkConfig;
use serde::Serialize;
use std::io;
use tabled::{Table, Tabled};

/// Snapshot of a session printed by `status`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    pub session_id: String,
    pub url: String,
    pub status: ConnectionStatus,
    pub subscriptions: usize,
}

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_status(&self, report: &StatusReport) -> Result<(), OutputError>;
    fn write_last_message(&self, message: &LastMessage) -> Result<(), OutputError>;
    fn write_config(&self, config: &MaasLinkConfig) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::MaasLinkError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_status(&self, report: &StatusReport) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("Session: {}", report.session_id);
                println!("  URL: {}", report.url);
                println!("  Status: {}", report.status);
                println!("  Subscriptions: {}", report.subscriptions);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Table => {
                let table = Table::new(vec![StatusTableRow::from(report)]);
                println!("{}", table);
            }
        }
        Ok(())
    }

    fn write_last_message(&self, message: &LastMessage) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                // one document per line so the stream can be piped
                println!("{}", serde_json::to_string(message)?);
            }
            OutputFormat::Text => {
                println!("{}", message);
            }
            OutputFormat::Table => {
                let table = Table::new(vec![MessageTableRow::from(message)]);
                println!("{}", table);
            }
        }
        Ok(())
    }

    fn write_config(&self, config: &MaasLinkConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                let session = &config.session;
                println!("maas-link Configuration:");
                println!("  Log level: {}", config.global.log_level);
                println!("  URL: {}", session.url);
                println!("  Connect timeout: {}ms", session.connect_timeout_ms);
                println!("  Reconnect delay: {}ms", session.reconnect_delay_ms);
                println!("  Heartbeat interval: {}ms", session.heartbeat_interval_ms);
                println!("  Max idle: {}ms", session.max_idle_ms);
                println!("  Active ping: {}", session.active_ping);
                println!("  Resubscribe delay: {}ms", session.resubscribe_delay_ms);
                println!("  Terminal close codes: {:?}", session.terminal_close_codes);
                if !session.headers.is_empty() {
                    println!("  Headers:");
                    for name in session.headers.keys() {
                        println!("    {}: <set>", name);
                    }
                }
                println!("  Subscriptions:");
                for (index, subscription) in config.subscriptions.iter().enumerate() {
                    println!("    {}: {}", index + 1, subscription.method);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(config)?);
            }
            OutputFormat::Table => {
                let rows: Vec<SubscriptionTableRow> = config
                    .subscriptions
                    .iter()
                    .enumerate()
                    .map(|(index, subscription)| SubscriptionTableRow {
                        request_id: index as u64 + 1,
                        method: subscription.method.clone(),
                        params: subscription.params.is_some(),
                    })
                    .collect();
                if !rows.is_empty() {
                    println!("{}", Table::new(rows));
                }
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

/// Table row for a status report
#[derive(Tabled)]
struct StatusTableRow {
    session: String,
    url: String,
    status: String,
    subscriptions: usize,
}

impl From<&StatusReport> for StatusTableRow {
    fn from(report: &StatusReport) -> Self {
        Self {
            session: report.session_id.clone(),
            url: report.url.clone(),
            status: report.status.to_string(),
            subscriptions: report.subscriptions,
        }
    }
}

/// Table row for a received message
#[derive(Tabled)]
struct MessageTableRow {
    kind: String,
    method: String,
    payload: String,
}

impl From<&LastMessage> for MessageTableRow {
    fn from(message: &LastMessage) -> Self {
        let kind = match message {
            LastMessage::Json(_) => "json",
            LastMessage::Raw(_) => "raw",
        };
        Self {
            kind: kind.to_string(),
            method: message.method().unwrap_or("-").to_string(),
            payload: message.to_string(),
        }
    }
}

/// Table row for one subscription request
#[derive(Tabled)]
struct SubscriptionTableRow {
    request_id: u64,
    method: String,
    params: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_row() {
        let row = MessageTableRow::from(&LastMessage::Json(json!({"name": "machine", "action": "update"})));
        assert_eq!(row.kind, "json");
        assert_eq!(row.method, "machine");

        let row = MessageTableRow::from(&LastMessage::Raw("garbage".to_string()));
        assert_eq!(row.kind, "raw");
        assert_eq!(row.method, "-");
        assert_eq!(row.payload, "garbage");
    }

    #[test]
    fn test_status_report_json() {
        let report = StatusReport {
            session_id: "ws_1".to_string(),
            url: "ws://localhost:8081/ws".to_string(),
            status: ConnectionStatus::Connected,
            subscriptions: 4,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "connected");
        assert_eq!(value["subscriptions"], 4);
        assert_eq!(StatusTableRow::from(&report).status, "connected");
    }

    #[test]
    fn test_console_writer_formats() {
        let writer = ConsoleWriter::new(OutputFormat::Json);
        assert_eq!(writer.format(), OutputFormat::Json);
        assert!(writer.write_message("hello").is_ok());
        assert!(writer.write_config(&MaasLinkConfig::default()).is_ok());
    }
}
