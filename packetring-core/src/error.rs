//! Packet queue error types
//!
//! Only genuine failures live here. An empty queue, a cursor that has caught
//! up, a trim with nothing to remove and a keyframe search that comes back
//! empty are all ordinary outcomes and are reported through return values.

use thiserror::Error;

/// Main error type for packet queue operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// A packet referenced a slot outside the image ring
    #[error("Slot {slot} out of range for ring capacity {capacity}")]
    SlotOutOfRange {
        /// Offending slot index
        slot: usize,
        /// Ring capacity of the queue
        capacity: usize,
    },

    /// A video packet was handed over without an image buffer slot
    #[error("Video packet on stream {stream_id} does not reference an image buffer slot")]
    UnslottedVideo {
        /// Stream the packet belongs to
        stream_id: u32,
    },

    /// Ring bookkeeping no longer matches the queued packets
    #[error(
        "Ring index inconsistency: expected slot {expected}, found {found:?} (queue size {queue_size})"
    )]
    RingInconsistency {
        /// Slot index the queue expected to see
        expected: usize,
        /// Slot index actually observed, if any
        found: Option<usize>,
        /// Queue length when the inconsistency was detected
        queue_size: usize,
    },
}

/// Result type alias for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

impl QueueError {
    /// Check if error is recoverable
    ///
    /// A rejected packet leaves the queue untouched, so the producer may carry
    /// on with the next one. A ring inconsistency means the producer's slot
    /// sequence went wrong and should not be retried blindly.
    pub fn is_recoverable(&self) -> bool {
        match self {
            QueueError::InvalidConfiguration { .. } => false,
            QueueError::SlotOutOfRange { .. } => true,
            QueueError::UnslottedVideo { .. } => true,
            QueueError::RingInconsistency { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            QueueError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            QueueError::SlotOutOfRange { .. } => ErrorCategory::Producer,
            QueueError::UnslottedVideo { .. } => ErrorCategory::Producer,
            QueueError::RingInconsistency { .. } => ErrorCategory::Consistency,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration and parameter errors
    Configuration,
    /// Packets the producer should not have handed over
    Producer,
    /// Internal bookkeeping violated
    Consistency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let error = QueueError::SlotOutOfRange {
            slot: 9,
            capacity: 4,
        };
        assert_eq!(error.category(), ErrorCategory::Producer);
        assert!(error.is_recoverable());

        let error = QueueError::RingInconsistency {
            expected: 3,
            found: Some(1),
            queue_size: 7,
        };
        assert_eq!(error.category(), ErrorCategory::Consistency);
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = QueueError::RingInconsistency {
            expected: 2,
            found: None,
            queue_size: 0,
        };
        assert_eq!(
            error.to_string(),
            "Ring index inconsistency: expected slot 2, found None (queue size 0)"
        );

        let error = QueueError::UnslottedVideo { stream_id: 1 };
        assert_eq!(
            error.to_string(),
            "Video packet on stream 1 does not reference an image buffer slot"
        );
    }
}
