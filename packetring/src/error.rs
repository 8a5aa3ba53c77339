//! Error types for Packet Ring

use packetring_core::QueueError;
use thiserror::Error;

/// Main error type for Packet Ring setup and configuration
#[derive(Error, Debug)]
pub enum PacketRingError {
    /// Queue error
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Configuration file could not be read
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Configuration could not be parsed
    #[error("Configuration parse error: {source}")]
    Parse {
        /// Underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Logging subscriber could not be installed
    #[error("Logging initialization failed: {reason}")]
    Logging {
        /// Reason for failure
        reason: String,
    },
}

/// Result type alias for Packet Ring operations
pub type PacketRingResult<T> = Result<T, PacketRingError>;
