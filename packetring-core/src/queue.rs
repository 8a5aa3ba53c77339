//! Thread-shared packet queue
//!
//! [`PacketQueue`] sits between the capture producer, the analysis consumer
//! and the recording consumer. All state lives behind a single mutex, so
//! enqueue, pop, trim, flush and the cursor operations are atomic with
//! respect to one another. Nothing here blocks on anything but that lock.

use crate::config::QueueConfig;
use crate::cursor::AnalysisCursor;
use crate::error::{QueueError, QueueResult};
use crate::packet::{Packet, QueuedPacket};
use crate::retention::{self, TrimPlan};
use crate::ring::{Admission, RingState, RingTracker};
use crate::stats::{QueueStats, Removal};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::time::SystemTime;
use tracing::{debug, error, trace, warn};

/// Bounded FIFO of coded packets shared by capture, analysis and recording
pub struct PacketQueue<T = Bytes> {
    video_stream_id: u32,
    state: Mutex<QueueState<T>>,
}

struct Entry<T> {
    seq: u64,
    packet: QueuedPacket<T>,
}

struct QueueState<T> {
    entries: VecDeque<Entry<T>>,
    /// Sequence number the next enqueued packet receives
    next_seq: u64,
    ring: RingTracker,
    cursor: AnalysisCursor,
    stats: QueueStats,
}

impl<T> QueueState<T> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_seq: 0,
            ring: RingTracker::new(capacity),
            cursor: AnalysisCursor::default(),
            stats: QueueStats::default(),
        }
    }

    fn front_seq(&self) -> u64 {
        self.entries
            .front()
            .map(|entry| entry.seq)
            .unwrap_or(self.next_seq)
    }

    fn cursor_offset(&self) -> usize {
        self.cursor.offset(self.front_seq())
    }

    fn packets(&self) -> impl DoubleEndedIterator<Item = &Packet<T>> + ExactSizeIterator + '_ {
        self.entries.iter().map(|entry| entry.packet.packet())
    }

    fn push(&mut self, packet: QueuedPacket<T>) -> QueueResult<()> {
        let header = packet.packet();
        if header.is_video() && packet.ring_slot().is_none() {
            return Err(QueueError::UnslottedVideo {
                stream_id: header.stream_id,
            });
        }

        if let Some(slot) = packet.ring_slot() {
            match self.ring.admission(slot, self.entries.len())? {
                Admission::Free => {}
                Admission::CatchUp => {
                    let evicted = self.catch_up(slot)?;
                    debug!(
                        slot,
                        evicted,
                        queue_size = self.entries.len(),
                        "Caught up with wrapped image slot"
                    );
                }
            }
            self.ring.admit(slot);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(Entry { seq, packet });
        self.stats.record_enqueue(self.entries.len());

        Ok(())
    }

    /// Evict from the head until the packet holding `slot` is gone
    fn catch_up(&mut self, slot: usize) -> QueueResult<usize> {
        let mut evicted = 0;
        let mut last_video_slot = None;

        loop {
            let Some(packet) = self.remove_head(Removal::CatchUp) else {
                return Err(QueueError::RingInconsistency {
                    expected: slot,
                    found: last_video_slot,
                    queue_size: self.entries.len(),
                });
            };
            evicted += 1;

            let released = packet.ring_slot();
            drop(packet);

            if released == Some(slot) {
                return Ok(evicted);
            }
            if released.is_some() {
                last_video_slot = released;
            }
        }
    }

    /// Single removal path shared by pop, catch-up, trim and flush.
    ///
    /// The cursor is moved off the head entry before it leaves the store.
    fn remove_head(&mut self, removal: Removal) -> Option<QueuedPacket<T>> {
        let head_seq = self.entries.front()?.seq;
        let unanalysed = self.cursor.on_head_removed(head_seq);
        let entry = self.entries.pop_front()?;

        if unanalysed && removal != Removal::Flushed {
            warn!(
                seq = entry.seq,
                ?removal,
                "Analysis is not keeping up, removing packet before it was analysed"
            );
        }

        if let Some(slot) = entry.packet.ring_slot() {
            self.ring.retire(slot);
            trace!(
                slot,
                video_count = self.ring.video_count(),
                oldest_slot = ?self.ring.oldest_slot(),
                "Released image slot"
            );
        }

        self.stats.record_removal(removal, unanalysed);
        Some(entry.packet)
    }

    /// Remove up to `count` packets from the head, dropping them
    fn evict_front(&mut self, count: usize, removal: Removal) -> usize {
        let mut evicted = 0;
        while evicted < count {
            match self.remove_head(removal) {
                Some(packet) => {
                    drop(packet);
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }
}

impl<T> PacketQueue<T> {
    /// Create new packet queue
    ///
    /// `image_buffer_size` is the size of the shared image ring buffer; the
    /// queue references at most `image_buffer_size - 1` of its slots.
    pub fn new(image_buffer_size: usize, video_stream_id: u32) -> QueueResult<Self> {
        Self::with_config(&QueueConfig::new(image_buffer_size, video_stream_id))
    }

    /// Create packet queue from configuration
    pub fn with_config(config: &QueueConfig) -> QueueResult<Self> {
        config.validate()?;

        debug!(
            image_buffer_size = config.image_buffer_size,
            capacity = config.ring_capacity(),
            video_stream_id = config.video_stream_id,
            "Creating packet queue"
        );

        Ok(Self {
            video_stream_id: config.video_stream_id,
            state: Mutex::new(QueueState::new(config.ring_capacity())),
        })
    }

    /// Append a packet at the tail.
    ///
    /// A slotted video packet whose slot is still held by the oldest queued
    /// video packet first evicts from the head up to and including that
    /// packet. Rejected packets are dropped and leave the queue untouched.
    pub fn enqueue(&self, packet: QueuedPacket<T>) -> QueueResult<()> {
        let mut state = self.state.lock();

        let result = state.push(packet);
        if let Err(err) = &result {
            state.stats.rejected_packets += 1;
            match err {
                QueueError::RingInconsistency {
                    expected,
                    found,
                    queue_size,
                } => error!(
                    expected,
                    ?found,
                    queue_size,
                    video_count = state.ring.video_count(),
                    "Image slot reused out of ring order, rejecting packet"
                ),
                other => warn!(error = %other, "Rejecting packet"),
            }
        }

        result
    }

    /// Remove and return the head packet
    ///
    /// Owned packets are handed to the caller; shared packets hand over the
    /// slot reference.
    pub fn pop_head(&self) -> Option<QueuedPacket<T>> {
        self.state.lock().remove_head(Removal::Popped)
    }

    /// Number of queued packets
    pub fn size(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Number of queued packets
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Number of queued video packets
    pub fn video_packet_count(&self) -> usize {
        self.state.lock().ring.video_count()
    }

    /// Snapshot of the ring index state
    pub fn ring_state(&self) -> RingState {
        self.state.lock().ring.state()
    }

    /// Maximum distinct image slots in flight
    pub fn capacity(&self) -> usize {
        self.state.lock().ring.capacity()
    }

    /// Stream id of the primary video track
    pub fn video_stream_id(&self) -> u32 {
        self.video_stream_id
    }

    /// Snapshot of queue statistics
    pub fn stats(&self) -> QueueStats {
        self.state.lock().stats.clone()
    }

    /// Run `f` on the packet under the analysis cursor while holding the lock
    pub fn with_analysis_packet<R>(&self, f: impl FnOnce(&Packet<T>) -> R) -> Option<R> {
        let state = self.state.lock();
        let offset = state.cursor_offset();
        state
            .entries
            .get(offset)
            .map(|entry| f(entry.packet.packet()))
    }

    /// Clone of the packet under the analysis cursor
    pub fn peek(&self) -> Option<Packet<T>>
    where
        T: Clone,
    {
        self.with_analysis_packet(Packet::clone)
    }

    /// Move the analysis cursor past the current packet.
    ///
    /// Returns `false` once analysis has caught up with the tail; the next
    /// enqueued packet then shows up under the cursor.
    pub fn advance(&self) -> bool {
        let mut state = self.state.lock();
        let front_seq = state.front_seq();
        let len = state.entries.len();
        state.cursor.advance(front_seq, len)
    }

    /// Packets from the analysis cursor to the tail
    pub fn analysis_backlog(&self) -> usize {
        let state = self.state.lock();
        state.entries.len().saturating_sub(state.cursor_offset())
    }

    /// Trim the head so that the last `frames_to_keep` packets of `stream_id`
    /// remain, starting at a keyframe of that stream.
    ///
    /// Returns the number of evicted packets.
    pub fn trim_to_keyframe_window(&self, frames_to_keep: usize, stream_id: u32) -> usize {
        let mut state = self.state.lock();

        let plan = retention::plan_keyframe_window(state.packets(), frames_to_keep, stream_id);
        match plan {
            TrimPlan::NothingToTrim => {
                trace!(
                    frames_to_keep,
                    queue_size = state.entries.len(),
                    "Nothing to trim"
                );
            }
            TrimPlan::KeepFrom(index) => {
                debug!(
                    frames_to_keep,
                    stream_id,
                    keep_from = index,
                    queue_size = state.entries.len(),
                    "Trimming to keyframe window"
                );
            }
            TrimPlan::Shortfall { missing } => {
                debug!(
                    stream_id,
                    missing, "Hit head of queue, still short of video frames"
                );
            }
            TrimPlan::NoKeyframe => {
                state.stats.keyframe_fallbacks += 1;
                warn!(
                    frames_to_keep,
                    stream_id,
                    queue_size = state.entries.len(),
                    "No keyframe to start the window on, keeping whole queue"
                );
            }
        }

        let evicted = state.evict_front(plan.evict_count(), Removal::Trimmed);
        if evicted > 0 {
            debug!(
                evicted,
                queue_size = state.entries.len(),
                "Trimmed packet queue"
            );
        }
        evicted
    }

    /// Trim the primary video stream to `frames_to_keep` frames
    pub fn trim_video_window(&self, frames_to_keep: usize) -> usize {
        self.trim_to_keyframe_window(frames_to_keep, self.video_stream_id)
    }

    /// Drop everything before the latest keyframe of `stream_id` captured at
    /// or before `recording_start`, so a recording can begin on it.
    ///
    /// Returns the number of evicted packets.
    pub fn clear_unwanted_packets(&self, recording_start: SystemTime, stream_id: u32) -> usize {
        let mut state = self.state.lock();

        let plan = retention::plan_recording_start(state.packets(), recording_start, stream_id);
        if plan == TrimPlan::NoKeyframe {
            state.stats.keyframe_fallbacks += 1;
            warn!(
                stream_id,
                queue_size = state.entries.len(),
                "No keyframe before recording start, keeping whole queue"
            );
        }

        let evicted = state.evict_front(plan.evict_count(), Removal::Trimmed);
        debug!(
            evicted,
            queue_size = state.entries.len(),
            "Cleared packets preceding recording start"
        );
        evicted
    }

    /// Remove every packet and reset ring and cursor state.
    ///
    /// Returns the number of discarded packets.
    pub fn flush_all(&self) -> usize {
        let mut state = self.state.lock();

        let count = state.entries.len();
        let flushed = state.evict_front(count, Removal::Flushed);

        state.ring.reset();
        let head_seq = state.next_seq;
        state.cursor.reset(head_seq);

        debug!(flushed, "Flushed packet queue");
        flushed
    }
}

impl<T> fmt::Debug for PacketQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PacketQueue")
            .field("video_stream_id", &self.video_stream_id)
            .field("len", &state.entries.len())
            .field("ring", &state.ring.state())
            .field("cursor_offset", &state.cursor_offset())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const VIDEO: u32 = 0;
    const AUDIO: u32 = 1;

    fn video(slot: usize, keyframe: bool) -> QueuedPacket<usize> {
        QueuedPacket::shared(slot, Arc::new(Packet::video(VIDEO, keyframe, slot)))
    }

    fn audio(tag: usize) -> QueuedPacket<usize> {
        QueuedPacket::owned(Packet::audio(AUDIO, tag))
    }

    #[test]
    fn test_wrapped_slot_catches_up() {
        let queue = PacketQueue::new(3, VIDEO).unwrap();
        queue.enqueue(video(0, true)).unwrap();
        queue.enqueue(video(1, false)).unwrap();

        assert_eq!(
            queue.ring_state(),
            RingState {
                video_count: 2,
                oldest_slot: Some(0),
                capacity: 2,
            }
        );

        queue.enqueue(video(0, false)).unwrap();

        let ring = queue.ring_state();
        assert_eq!(ring.video_count, 2);
        assert_eq!(ring.oldest_slot, Some(1));
        assert_eq!(queue.size(), 2);
        assert_eq!(queue.stats().catch_up_evictions, 1);
    }

    #[test]
    fn test_catch_up_evicts_interleaved_audio() {
        let queue = PacketQueue::new(3, VIDEO).unwrap();
        queue.enqueue(audio(100)).unwrap();
        queue.enqueue(video(0, true)).unwrap();
        queue.enqueue(audio(101)).unwrap();
        queue.enqueue(video(1, false)).unwrap();

        queue.enqueue(video(0, false)).unwrap();

        // audio 100 and video 0 went, audio 101 now leads
        assert_eq!(queue.size(), 3);
        assert_eq!(queue.peek().map(|p| p.payload), Some(101));
        assert_eq!(queue.stats().catch_up_evictions, 2);
    }

    #[test]
    fn test_empty_queue_returns_nothing() {
        let queue: PacketQueue<usize> = PacketQueue::new(4, VIDEO).unwrap();

        assert!(queue.pop_head().is_none());
        assert!(queue.peek().is_none());
        assert!(!queue.advance());
        assert_eq!(queue.trim_to_keyframe_window(5, 7), 0);
        assert_eq!(queue.analysis_backlog(), 0);
    }

    #[test]
    fn test_pop_head_updates_ring() {
        let queue = PacketQueue::new(4, VIDEO).unwrap();
        queue.enqueue(video(0, true)).unwrap();
        queue.enqueue(video(1, false)).unwrap();

        let head = queue.pop_head().unwrap();
        assert_eq!(head.slot_index(), Some(0));
        assert_eq!(queue.ring_state().oldest_slot, Some(1));

        queue.pop_head().unwrap();
        assert_eq!(queue.ring_state().oldest_slot, None);
        assert_eq!(queue.video_packet_count(), 0);
    }

    #[test]
    fn test_unslotted_video_is_rejected() {
        let queue = PacketQueue::new(4, VIDEO).unwrap();
        let result = queue.enqueue(QueuedPacket::owned(Packet::video(VIDEO, true, 0usize)));

        assert_eq!(result, Err(QueueError::UnslottedVideo { stream_id: VIDEO }));
        assert!(queue.is_empty());
        assert_eq!(queue.stats().rejected_packets, 1);
    }

    #[test]
    fn test_out_of_order_slot_leaves_queue_untouched() {
        let queue = PacketQueue::new(4, VIDEO).unwrap();
        queue.enqueue(video(0, true)).unwrap();
        queue.enqueue(video(1, false)).unwrap();

        let result = queue.enqueue(video(1, false));
        assert_eq!(
            result,
            Err(QueueError::RingInconsistency {
                expected: 0,
                found: Some(1),
                queue_size: 2,
            })
        );
        assert_eq!(queue.size(), 2);
        assert_eq!(queue.video_packet_count(), 2);
    }

    #[test]
    fn test_cursor_walks_each_packet_once() {
        let queue = PacketQueue::new(8, VIDEO).unwrap();
        for slot in 0..3 {
            queue.enqueue(video(slot, slot == 0)).unwrap();
        }

        let mut seen = Vec::new();
        while let Some(packet) = queue.peek() {
            seen.push(packet.payload);
            if !queue.advance() {
                break;
            }
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert!(queue.peek().is_none());
        assert_eq!(queue.analysis_backlog(), 0);

        queue.enqueue(video(3, false)).unwrap();
        assert_eq!(queue.peek().map(|p| p.payload), Some(3));
    }

    #[test]
    fn test_pop_moves_cursor_off_removed_packet() {
        let queue = PacketQueue::new(8, VIDEO).unwrap();
        queue.enqueue(video(0, true)).unwrap();
        queue.enqueue(video(1, false)).unwrap();

        assert_eq!(queue.peek().map(|p| p.payload), Some(0));
        queue.pop_head().unwrap();
        assert_eq!(queue.peek().map(|p| p.payload), Some(1));

        queue.pop_head().unwrap();
        assert!(queue.peek().is_none());

        queue.enqueue(video(2, true)).unwrap();
        assert_eq!(queue.peek().map(|p| p.payload), Some(2));
        assert_eq!(queue.stats().unanalysed_removals, 2);
    }

    #[test]
    fn test_trim_is_idempotent() {
        let queue = PacketQueue::new(32, VIDEO).unwrap();
        for slot in 0..15 {
            queue.enqueue(video(slot, slot % 5 == 0)).unwrap();
        }

        assert_eq!(queue.trim_video_window(3), 10);
        assert_eq!(queue.peek().map(|p| p.payload), Some(10));
        assert_eq!(queue.video_packet_count(), 5);
        assert_eq!(queue.ring_state().oldest_slot, Some(10));

        assert_eq!(queue.trim_video_window(3), 0);
        assert_eq!(queue.size(), 5);
    }

    #[test]
    fn test_trim_without_keyframe_keeps_everything() {
        let queue = PacketQueue::new(32, VIDEO).unwrap();
        for slot in 0..10 {
            queue.enqueue(video(slot, false)).unwrap();
        }

        assert_eq!(queue.trim_video_window(2), 0);
        assert_eq!(queue.size(), 10);
        assert_eq!(queue.stats().keyframe_fallbacks, 1);
    }

    #[test]
    fn test_flush_resets_state() {
        let queue = PacketQueue::new(4, VIDEO).unwrap();
        queue.enqueue(video(0, true)).unwrap();
        queue.enqueue(audio(1)).unwrap();
        queue.enqueue(video(1, false)).unwrap();
        queue.advance();

        assert_eq!(queue.flush_all(), 3);
        assert!(queue.is_empty());
        assert_eq!(
            queue.ring_state(),
            RingState {
                video_count: 0,
                oldest_slot: None,
                capacity: 3,
            }
        );

        queue.enqueue(video(2, true)).unwrap();
        assert_eq!(queue.peek().map(|p| p.payload), Some(2));
        assert_eq!(queue.ring_state().oldest_slot, Some(2));
    }

    #[test]
    fn test_invalid_image_buffer_size() {
        assert!(matches!(
            PacketQueue::<Bytes>::new(1, VIDEO),
            Err(QueueError::InvalidConfiguration { .. })
        ));
    }
}
