//! `tracing` subscriber setup.

use crate::config::{LogFormat, LoggingConfig};
use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. Output goes to stderr so stdout carries only sample
/// results.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match config.format {
        LogFormat::Json => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).try_init()
        }
        LogFormat::Compact => subscriber.compact().try_init(),
        LogFormat::Pretty => subscriber.pretty().try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_directive_is_an_error() {
        // SAFETY: no other test in this crate reads RUST_LOG concurrently.
        unsafe { std::env::remove_var("RUST_LOG") };
        let config = LoggingConfig { level: "rocblas=notalevel".into(), ..Default::default() };
        assert!(setup_logging(&config).is_err());
    }
}
