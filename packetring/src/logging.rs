//! Tracing subscriber bootstrap

use crate::config::LoggingConfig;
use crate::error::{PacketRingError, PacketRingResult};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured default directive. Fails
/// if the directive is invalid or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> PacketRingResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_directive).map_err(|e| {
            PacketRingError::Logging {
                reason: format!("invalid directive '{}': {}", config.default_directive, e),
            }
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| PacketRingError::Logging {
            reason: e.to_string(),
        })
}
