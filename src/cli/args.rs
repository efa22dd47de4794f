use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for maas-link
#[derive(Parser, Debug)]
#[command(
    name = "maas-link",
    version = env!("CARGO_PKG_VERSION"),
    about = "Resilient WebSocket session client for MAAS",
    long_about = "Keeps a WebSocket session to a MAAS server alive: reconnects on failure, replays subscriptions after every (re)connection and closes idle connections."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// WebSocket URL, overrides the configured one
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect and print every non-control message
    Watch(WatchArgs),
    /// Connect, send one payload and print the latest message
    Send(SendArgs),
    /// Connect and report the connection status
    Status(StatusArgs),
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
}

#[derive(ClapArgs, Debug)]
pub struct WatchArgs {
    /// Stop after this many messages
    #[arg(short = 'n', long)]
    pub count: Option<u64>,
}

#[derive(ClapArgs, Debug)]
pub struct SendArgs {
    /// JSON payload to send
    pub payload: String,

    /// How long to wait for a reply after sending, in milliseconds
    #[arg(short, long, default_value = "2000")]
    pub wait_ms: u64,
}

#[derive(ClapArgs, Debug)]
pub struct StatusArgs {
    /// How long to wait for the connection to open, in milliseconds
    #[arg(short, long, default_value = "5000")]
    pub wait_ms: u64,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Create a default project configuration
    Init {
        /// Directory to create `.maas-link/config.toml` in
        #[arg(short, long)]
        dir: Option<String>,
    },
    /// Print the configuration file paths
    Path,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}
