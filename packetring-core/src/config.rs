//! Queue configuration

use crate::error::{QueueError, QueueResult};
use serde::{Deserialize, Serialize};

/// Default number of images in the shared ring buffer
pub const DEFAULT_IMAGE_BUFFER_SIZE: usize = 20;

/// Packet queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Number of images in the shared ring buffer
    pub image_buffer_size: usize,
    /// Stream id of the primary video track
    pub video_stream_id: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            image_buffer_size: DEFAULT_IMAGE_BUFFER_SIZE,
            video_stream_id: 0,
        }
    }
}

impl QueueConfig {
    /// Create new configuration
    pub fn new(image_buffer_size: usize, video_stream_id: u32) -> Self {
        Self {
            image_buffer_size,
            video_stream_id,
        }
    }

    /// Small image ring for memory constrained devices
    pub fn embedded() -> Self {
        Self {
            image_buffer_size: 8, // ~0.25s of 30fps video
            video_stream_id: 0,
        }
    }

    /// Large image ring for multi-second pre-event recording
    pub fn server() -> Self {
        Self {
            image_buffer_size: 120, // 4s of 30fps video
            video_stream_id: 0,
        }
    }

    /// Maximum distinct image slots the queue may reference at once.
    ///
    /// One image stays reserved for the producer currently writing.
    pub fn ring_capacity(&self) -> usize {
        self.image_buffer_size.saturating_sub(1)
    }

    /// Validate configuration
    pub fn validate(&self) -> QueueResult<()> {
        if self.ring_capacity() == 0 {
            return Err(QueueError::InvalidConfiguration {
                message: format!(
                    "image buffer size must be at least 2, got {}",
                    self.image_buffer_size
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.image_buffer_size, DEFAULT_IMAGE_BUFFER_SIZE);
        assert_eq!(config.ring_capacity(), DEFAULT_IMAGE_BUFFER_SIZE - 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        let embedded = QueueConfig::embedded();
        let server = QueueConfig::server();

        assert!(embedded.validate().is_ok());
        assert!(server.validate().is_ok());
        assert!(embedded.ring_capacity() < QueueConfig::default().ring_capacity());
        assert!(server.ring_capacity() > QueueConfig::default().ring_capacity());
    }

    #[test]
    fn test_too_small_image_buffer_rejected() {
        for size in [0, 1] {
            let config = QueueConfig::new(size, 0);
            assert!(matches!(
                config.validate(),
                Err(QueueError::InvalidConfiguration { .. })
            ));
        }

        assert!(QueueConfig::new(2, 0).validate().is_ok());
    }
}
