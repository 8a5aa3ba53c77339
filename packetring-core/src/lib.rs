//! # Packet Ring Core
//!
//! Bounded, thread-shared FIFO of coded media packets. The queue sits
//! between a capture producer, an analysis consumer walking a read cursor,
//! and a recording consumer that drains the head and trims the backlog to a
//! keyframe-aligned window.
//!
//! Video packets reference slots of an externally owned image ring buffer.
//! The queue never holds two references to the same slot, and never more
//! than `image_buffer_size - 1` of them.

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod packet;
pub mod queue;
pub mod ring;
pub mod stats;

mod cursor;
mod retention;

// Re-export main types
pub use config::{QueueConfig, DEFAULT_IMAGE_BUFFER_SIZE};
pub use error::{ErrorCategory, QueueError, QueueResult};
pub use packet::{CodecKind, Packet, QueuedPacket, SlotRef};
pub use queue::PacketQueue;
pub use ring::RingState;
pub use stats::QueueStats;
