use crate::cli::args::{Args, Command, ConfigArgs, ConfigCommand, SendArgs, StatusArgs, WatchArgs};
use crate::cli::output::{ConsoleWriter, OutputWriter, StatusReport};
use crate::core::session::{ConnectionStatus, SessionHandle, SessionManager, SubscriptionSet};
use crate::domain::config::MaasLinkConfig;
use crate::domain::error::{MaasLinkError, MaasLinkResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::ws::WsConnector;
use std::time::Duration;
use tracing::{debug, info};

/// Grace period for the close frame to go out before the process exits
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Execute CLI command
pub async fn execute_command(args: Args) -> Result<(), MaasLinkError> {
    let writer = ConsoleWriter::new(args.output);

    // Load configuration using ConfigManager
    let config_manager = ConfigManager::new()?;
    let mut config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };
    if let Some(url) = &args.url {
        config.session.url = url.clone();
    }
    config.session.validate()?;

    // Initialize logging
    if !args.quiet {
        init_logging(&config.global.log_level, args.verbose).map_err(|e| MaasLinkError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })?;
    }

    match args.command {
        Command::Watch(watch_args) => execute_watch(watch_args, &writer, &config).await,
        Command::Send(send_args) => execute_send(send_args, &writer, &config).await,
        Command::Status(status_args) => execute_status(status_args, &writer, &config).await,
        Command::Config(config_args) => execute_config_command(config_args, &writer, &config, &config_manager),
        Command::Version => {
            writer.write_message(&format!("maas-link {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

fn start_session(config: &MaasLinkConfig) -> MaasLinkResult<SessionHandle> {
    let subscriptions = SubscriptionSet::from_configs(&config.subscriptions)?;
    SessionManager::spawn(config.session.clone(), subscriptions, WsConnector::new())
}

async fn finish(handle: &SessionHandle) {
    handle.shutdown();
    let _ = tokio::time::timeout(
        SHUTDOWN_GRACE,
        handle.wait_for_status(ConnectionStatus::Disconnected),
    )
    .await;
    // let the transport task flush its close frame
    tokio::time::sleep(Duration::from_millis(50)).await;
}

async fn execute_watch(
    args: WatchArgs,
    writer: &ConsoleWriter,
    config: &MaasLinkConfig,
) -> Result<(), MaasLinkError> {
    let handle = start_session(config)?;
    let mut messages = handle.watch_messages();
    let mut status = handle.watch_status();
    let mut received = 0u64;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // latest-value semantics: a burst may be coalesced into its last message
    loop {
        tokio::select! {
            changed = messages.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = messages.borrow_and_update().clone();
                if let Some(message) = latest {
                    writer.write_last_message(&message)?;
                    received += 1;
                    if args.count.is_some_and(|count| received >= count) {
                        break;
                    }
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                info!("Connection status: {}", current);
            }
            _ = &mut ctrl_c => {
                info!("Interrupted, closing session");
                break;
            }
        }
    }

    debug!("Watch finished after {} messages", received);
    finish(&handle).await;
    Ok(())
}

async fn execute_send(
    args: SendArgs,
    writer: &ConsoleWriter,
    config: &MaasLinkConfig,
) -> Result<(), MaasLinkError> {
    validate_payload(&args.payload)?;

    let handle = start_session(config)?;
    let limit = config.session.connect_timeout();
    let connected = tokio::time::timeout(limit, handle.wait_for_status(ConnectionStatus::Connected))
        .await
        .map_err(|_| MaasLinkError::Timeout(limit.as_millis() as u64))
        .and_then(|result| result);
    if let Err(e) = connected {
        finish(&handle).await;
        return Err(e);
    }

    handle.send_message(args.payload);
    tokio::time::sleep(Duration::from_millis(args.wait_ms)).await;

    match handle.last_message() {
        Some(message) => writer.write_last_message(&message)?,
        None => writer.write_message("No message received")?,
    }

    finish(&handle).await;
    Ok(())
}

async fn execute_status(
    args: StatusArgs,
    writer: &ConsoleWriter,
    config: &MaasLinkConfig,
) -> Result<(), MaasLinkError> {
    let handle = start_session(config)?;

    let _ = tokio::time::timeout(
        Duration::from_millis(args.wait_ms),
        handle.wait_for_status(ConnectionStatus::Connected),
    )
    .await;

    let report = StatusReport {
        session_id: handle.session_id().to_string(),
        url: config.session.url.clone(),
        status: handle.status(),
        subscriptions: config.subscriptions.len(),
    };
    writer.write_status(&report)?;

    finish(&handle).await;
    Ok(())
}

fn execute_config_command(
    args: ConfigArgs,
    writer: &ConsoleWriter,
    config: &MaasLinkConfig,
    config_manager: &ConfigManager,
) -> Result<(), MaasLinkError> {
    match args.command {
        ConfigCommand::Show => {
            writer.write_config(config)?;
            Ok(())
        }
        ConfigCommand::Init { dir } => {
            let base = match dir {
                Some(dir) => dir.into(),
                None => std::env::current_dir().map_err(|e| MaasLinkError::Config {
                    message: format!("Failed to get current directory: {}", e),
                })?,
            };
            let path = config_manager.init_project_config(&base)?;
            writer.write_message(&format!("Project configuration initialized at '{}'", path.display()))?;
            Ok(())
        }
        ConfigCommand::Path => {
            writer.write_message(&format!(
                "Global: {}",
                config_manager.get_global_config_path_ref().display()
            ))?;
            match config_manager.get_project_config_path() {
                Some(path) => writer.write_message(&format!("Project: {}", path.display()))?,
                None => writer.write_message("Project: none")?,
            }
            Ok(())
        }
    }
}

/// Outbound payloads must be JSON documents
fn validate_payload(payload: &str) -> MaasLinkResult<()> {
    serde_json::from_str::<serde_json::Value>(payload)
        .map(|_| ())
        .map_err(|e| MaasLinkError::InvalidInput(format!("Payload is not valid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_payload() {
        assert!(validate_payload(r#"{"method":"zone.list","type":0,"request_id":5}"#).is_ok());
        assert!(matches!(
            validate_payload("zone.list"),
            Err(MaasLinkError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_start_session_spawns_handle() {
        let config = MaasLinkConfig::default();

        let handle = start_session(&config).unwrap();
        assert!(handle.session_id().starts_with("ws_"));

        finish(&handle).await;
        assert_eq!(handle.status(), ConnectionStatus::Disconnected);
    }
}
