use clap::Parser;
use maas_link::cli::args::{Args, Command, ConfigCommand, OutputFormat};
use std::process::Command as Process;
use std::str;

/// CLI interface tests
#[cfg(test)]
mod cli_tests {
    use super::*;

    fn maas_link() -> Process {
        Process::new(env!("CARGO_BIN_EXE_maas-link"))
    }

    #[test]
    fn test_cli_help() {
        let output = maas_link()
            .arg("--help")
            .output()
            .expect("Failed to execute command");

        let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");

        assert!(stdout.contains("Usage:"));
        assert!(stdout.contains("Commands:"));
        assert!(stdout.contains("watch"));
        assert!(stdout.contains("send"));
        assert!(stdout.contains("status"));
        assert!(stdout.contains("config"));
    }

    #[test]
    fn test_cli_version() {
        let output = maas_link()
            .args(["-q", "version"])
            .output()
            .expect("Failed to execute command");

        let stdout = str::from_utf8(&output.stdout).expect("Invalid UTF-8");
        assert!(output.status.success());
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_cli_invalid_command() {
        let output = maas_link()
            .arg("invalid-command")
            .output()
            .expect("Failed to execute command");

        assert!(!output.status.success());
    }

    #[test]
    fn test_cli_rejects_non_websocket_url() {
        let output = maas_link()
            .args(["-q", "--url", "http://localhost:5240/MAAS", "status"])
            .output()
            .expect("Failed to execute command");

        let stderr = str::from_utf8(&output.stderr).expect("Invalid UTF-8");
        assert!(!output.status.success());
        assert!(stderr.contains("Error:"));
    }

    #[test]
    fn test_parse_watch() {
        let args = Args::try_parse_from(["maas-link", "--url", "ws://maas:5240/MAAS/ws", "watch", "-n", "3"]).unwrap();

        assert_eq!(args.url.as_deref(), Some("ws://maas:5240/MAAS/ws"));
        assert_eq!(args.output, OutputFormat::Text);
        match args.command {
            Command::Watch(watch) => assert_eq!(watch.count, Some(3)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_send_with_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "maas-link",
            "send",
            r#"{"method":"zone.list","type":0,"request_id":5}"#,
            "--wait-ms",
            "500",
            "--output",
            "json",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        assert_eq!(args.output, OutputFormat::Json);
        match args.command {
            Command::Send(send) => {
                assert_eq!(send.wait_ms, 500);
                assert!(send.payload.contains("zone.list"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_subcommands() {
        let args = Args::try_parse_from(["maas-link", "config", "init", "--dir", "/tmp/project"]).unwrap();
        match args.command {
            Command::Config(config) => match config.command {
                ConfigCommand::Init { dir } => assert_eq!(dir.as_deref(), Some("/tmp/project")),
                other => panic!("unexpected config command {:?}", other),
            },
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Args::try_parse_from(["maas-link", "--output", "yaml", "status"]).is_err());
        assert!(Args::try_parse_from(["maas-link", "send"]).is_err());
    }
}
