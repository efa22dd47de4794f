// Logging module - Logging infrastructure
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::io;

/// Filter used when neither `RUST_LOG` nor a usable level is given
const FALLBACK_FILTER: &str = "maas_link=info,warn,error";

/// Build the env filter: `RUST_LOG` wins, then the configured level
/// (raised to debug with `verbose`).
pub fn build_filter(level: &str, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = if verbose { "debug" } else { level };
    EnvFilter::try_new(format!("maas_link={},warn", level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Initialize logging system
pub fn init_logging(level: &str, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(build_filter(level, verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
        )
        .try_init()?;

    tracing::debug!("maas-link logging system initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_init() {
        assert!(init_logging("info", false).is_ok());
        // a second global subscriber is refused, not a panic
        assert!(init_logging("info", false).is_err());
    }

    #[test]
    fn test_verbose_raises_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        assert!(build_filter("info", true).to_string().contains("maas_link=debug"));
        assert!(build_filter("trace", false).to_string().contains("maas_link=trace"));
    }
}
