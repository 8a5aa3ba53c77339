//! Configuration types and defaults

use crate::error::{PacketRingError, PacketRingResult};
use packetring_core::QueueConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Top-level Packet Ring configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketRingConfig {
    /// Packet queue settings
    pub queue: QueueConfig,
    /// Recording retention settings
    pub recording: RecordingConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Retention policy used by the recording consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Video frames kept ahead of an event
    pub pre_event_frames: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            pre_event_frames: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Install a fmt subscriber on init
    pub enabled: bool,
    /// Filter directive used when `RUST_LOG` is unset
    pub default_directive: String,
    /// Emit ANSI colours
    pub ansi: bool,
    /// Include event targets
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_directive: "info".to_string(),
            ansi: true,
            with_target: true,
        }
    }
}

impl PacketRingConfig {
    /// Parse configuration from a JSON string
    pub fn from_json_str(json: &str) -> PacketRingResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> PacketRingResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Validate configuration
    pub fn validate(&self) -> PacketRingResult<()> {
        self.queue.validate()?;

        if self.recording.pre_event_frames > self.queue.ring_capacity() {
            return Err(PacketRingError::Configuration {
                message: format!(
                    "pre_event_frames ({}) exceeds the ring capacity ({})",
                    self.recording.pre_event_frames,
                    self.queue.ring_capacity()
                ),
            });
        }

        EnvFilter::try_new(&self.logging.default_directive).map_err(|e| {
            PacketRingError::Configuration {
                message: format!(
                    "invalid log directive '{}': {}",
                    self.logging.default_directive, e
                ),
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PacketRingConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.logging.enabled);
        assert_eq!(config.recording.pre_event_frames, 5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            PacketRingConfig::from_json_str(r#"{ "queue": { "image_buffer_size": 10 } }"#)
                .unwrap();

        assert_eq!(config.queue.image_buffer_size, 10);
        assert_eq!(config.queue.video_stream_id, 0);
        assert_eq!(config.logging.default_directive, "info");
    }

    #[test]
    fn test_pre_event_frames_must_fit_ring() {
        let mut config = PacketRingConfig::default();
        config.queue.image_buffer_size = 4;
        config.recording.pre_event_frames = 4;

        assert!(matches!(
            config.validate(),
            Err(PacketRingError::Configuration { .. })
        ));

        config.recording.pre_event_frames = 3;
        assert!(config.validate().is_ok());
    }
}
