//! Logging setup using `tracing-subscriber`
//!
//! Logs go to stderr so stdout carries only the report.
//!
//! - 0 (no `-v`): info
//! - 1 (`-v`): debug
//! - 2+ (`-vv`): trace
//!
//! `RUST_LOG`, when set, takes precedence over the verbosity flag.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging options from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LogConfig {
    pub(crate) level: Level,
    pub(crate) json: bool,
}

impl LogConfig {
    pub(crate) fn from_verbosity(verbosity: u8, json: bool) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self { level, json }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_ascii_lowercase()))
    }
}

/// Install the global subscriber
///
/// # Errors
/// Returns an error if a subscriber is already installed.
pub(crate) fn init(config: LogConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(config.filter());
    if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .try_init()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_level() {
        assert_eq!(LogConfig::from_verbosity(0, false).level, Level::INFO);
        assert_eq!(LogConfig::from_verbosity(1, false).level, Level::DEBUG);
        assert_eq!(LogConfig::from_verbosity(5, true).level, Level::TRACE);
        assert!(LogConfig::from_verbosity(0, true).json);
    }
}
