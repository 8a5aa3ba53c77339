//! # Packet Ring - Keyframe-Aware Packet Buffering
//!
//! Packet Ring buffers decoded-stream packets between a live capture
//! producer, an analysis consumer and a recording consumer. Video packets
//! reference slots of a shared image ring buffer; the queue makes sure it
//! never references more slots than the ring holds and that recordings
//! always start on a keyframe.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use packetring::{Bytes, Packet, PacketRing, PacketRingConfig, QueuedPacket};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), packetring::PacketRingError> {
//! let ring = PacketRing::init_with(PacketRingConfig::default())?;
//! let queue = ring.create_queue()?;
//!
//! // Capture: reference slot 0 of the shared image buffer
//! let frame = Arc::new(Packet::video(0, true, Bytes::from_static(b"idr")));
//! queue.enqueue(QueuedPacket::shared(0, frame))?;
//!
//! // Analysis: walk the cursor
//! while let Some(packet) = queue.peek() {
//!     println!("analysing packet on stream {}", packet.stream_id);
//!     if !queue.advance() {
//!         break;
//!     }
//! }
//!
//! // Recording: keep a keyframe-aligned pre-event window
//! ring.retain_pre_event(&queue);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use packetring_core::{
    CodecKind, ErrorCategory, Packet, PacketQueue, QueueConfig, QueueError, QueueResult,
    QueueStats, QueuedPacket, RingState, SlotRef, DEFAULT_IMAGE_BUFFER_SIZE,
};

/// Default packet payload type
pub use bytes::Bytes;

// Public API modules
pub mod config;
pub mod error;
pub mod logging;

// Re-export main API types
pub use config::{LoggingConfig, PacketRingConfig, RecordingConfig};
pub use error::{PacketRingError, PacketRingResult};
pub use logging::init_logging;

use std::sync::Arc;

/// Main entry point for Packet Ring
#[derive(Debug, Clone)]
pub struct PacketRing {
    config: Arc<PacketRingConfig>,
}

impl PacketRing {
    /// Initialize Packet Ring with default settings
    pub fn init() -> PacketRingResult<Self> {
        Self::init_with(PacketRingConfig::default())
    }

    /// Initialize with custom configuration
    ///
    /// Installs the logging subscriber when enabled. An already installed
    /// global subscriber is left in place.
    pub fn init_with(config: PacketRingConfig) -> PacketRingResult<Self> {
        config.validate()?;

        if config.logging.enabled {
            if let Err(e) = init_logging(&config.logging) {
                tracing::debug!("Keeping existing subscriber: {}", e);
            }
        }

        tracing::info!(
            image_buffer_size = config.queue.image_buffer_size,
            video_stream_id = config.queue.video_stream_id,
            pre_event_frames = config.recording.pre_event_frames,
            "Packet ring initialized"
        );

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &PacketRingConfig {
        &self.config
    }

    /// Create a queue shared by capture, analysis and recording
    pub fn create_queue<T>(&self) -> PacketRingResult<Arc<PacketQueue<T>>> {
        let queue = PacketQueue::with_config(&self.config.queue)?;
        Ok(Arc::new(queue))
    }

    /// Trim `queue` to the configured pre-event window on the video stream.
    ///
    /// Returns the number of evicted packets.
    pub fn retain_pre_event<T>(&self, queue: &PacketQueue<T>) -> usize {
        queue.trim_video_window(self.config.recording.pre_event_frames)
    }
}
