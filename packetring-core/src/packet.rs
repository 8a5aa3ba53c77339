//! Packet abstractions and ownership tags
//!
//! A queued packet either belongs to the queue outright or borrows a slot of
//! the shared image ring buffer. The two cases are separate variants of
//! [`QueuedPacket`], so whichever path removes an entry gets the right
//! destruction behaviour from ordinary drop semantics.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Coded media kinds carried by the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecKind {
    /// Video packet, references an image buffer slot
    Video,
    /// Audio packet
    Audio,
    /// Subtitle packet
    Subtitle,
    /// Any other data track
    Data,
}

/// One coded unit of audio or video
///
/// The payload is never interpreted by the queue.
#[derive(Debug, Clone)]
pub struct Packet<T = Bytes> {
    /// Codec kind of the owning stream
    pub codec_kind: CodecKind,
    /// Logical track identifier
    pub stream_id: u32,
    /// Whether this is a keyframe (video only)
    pub is_keyframe: bool,
    /// Presentation timestamp in stream time base units
    pub pts: Option<i64>,
    /// Wall clock time the packet was captured
    pub captured_at: SystemTime,
    /// Opaque payload
    pub payload: T,
}

impl<T> Packet<T> {
    /// Create new video packet
    pub fn video(stream_id: u32, is_keyframe: bool, payload: T) -> Self {
        Self {
            codec_kind: CodecKind::Video,
            stream_id,
            is_keyframe,
            pts: None,
            captured_at: SystemTime::now(),
            payload,
        }
    }

    /// Create new audio packet
    pub fn audio(stream_id: u32, payload: T) -> Self {
        Self {
            codec_kind: CodecKind::Audio,
            stream_id,
            is_keyframe: false,
            pts: None,
            captured_at: SystemTime::now(),
            payload,
        }
    }

    /// Set the presentation timestamp
    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = Some(pts);
        self
    }

    /// Set the capture time
    pub fn with_captured_at(mut self, captured_at: SystemTime) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Whether this packet carries video
    pub fn is_video(&self) -> bool {
        self.codec_kind == CodecKind::Video
    }

    /// Whether this packet is a keyframe of the given stream
    pub fn is_keyframe_of(&self, stream_id: u32) -> bool {
        self.stream_id == stream_id && self.is_keyframe
    }
}

/// Reference to a packet stored in the shared image ring buffer
///
/// The ring buffer owns the storage. Dropping a `SlotRef` only releases the
/// queue's reference; the slot itself is recycled by the ring buffer.
#[derive(Debug)]
pub struct SlotRef<T = Bytes> {
    index: usize,
    packet: Arc<Packet<T>>,
}

impl<T> SlotRef<T> {
    /// Create new slot reference
    pub fn new(index: usize, packet: Arc<Packet<T>>) -> Self {
        Self { index, packet }
    }

    /// Slot index in the shared image ring buffer
    pub fn index(&self) -> usize {
        self.index
    }

    /// Shared packet handle
    pub fn packet(&self) -> &Arc<Packet<T>> {
        &self.packet
    }
}

impl<T> Clone for SlotRef<T> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            packet: Arc::clone(&self.packet),
        }
    }
}

/// A packet as held by the queue
#[derive(Debug)]
pub enum QueuedPacket<T = Bytes> {
    /// Independently allocated, owned and destroyed by the queue
    Owned(Packet<T>),
    /// Lives in the shared image ring buffer, the queue only holds a reference
    Shared(SlotRef<T>),
}

impl<T> QueuedPacket<T> {
    /// Wrap a packet the queue should own
    pub fn owned(packet: Packet<T>) -> Self {
        QueuedPacket::Owned(packet)
    }

    /// Wrap a reference into the shared image ring buffer
    pub fn shared(index: usize, packet: Arc<Packet<T>>) -> Self {
        QueuedPacket::Shared(SlotRef::new(index, packet))
    }

    /// Underlying packet
    pub fn packet(&self) -> &Packet<T> {
        match self {
            QueuedPacket::Owned(packet) => packet,
            QueuedPacket::Shared(slot) => &slot.packet,
        }
    }

    /// Slot index, `None` for owned packets
    pub fn slot_index(&self) -> Option<usize> {
        match self {
            QueuedPacket::Owned(_) => None,
            QueuedPacket::Shared(slot) => Some(slot.index),
        }
    }

    /// Whether the queue owns this packet
    pub fn is_owned(&self) -> bool {
        matches!(self, QueuedPacket::Owned(_))
    }

    /// Slot this packet occupies in the ring index, if it is a slotted video packet
    pub(crate) fn ring_slot(&self) -> Option<usize> {
        match self {
            QueuedPacket::Shared(slot) if slot.packet.is_video() => Some(slot.index),
            _ => None,
        }
    }
}
