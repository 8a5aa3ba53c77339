//! Ring index tracking for slotted video packets
//!
//! The producer hands out image buffer slots in ring order. The tracker keeps
//! the number of queued video packets and the slot of the oldest one, and
//! decides whether an incoming slot can be appended directly or first needs
//! the queue to evict up to and including the packet still holding it.

use crate::error::{QueueError, QueueResult};
use serde::{Deserialize, Serialize};

/// Snapshot of the ring index state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingState {
    /// Number of video packets currently queued
    pub video_count: usize,
    /// Slot index of the oldest queued video packet
    pub oldest_slot: Option<usize>,
    /// Maximum distinct slots in flight
    pub capacity: usize,
}

/// What the queue must do before appending a slotted packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Slot is free, append directly
    Free,
    /// Slot is still held by the oldest video packet, evict up to it first
    CatchUp,
}

#[derive(Debug)]
pub(crate) struct RingTracker {
    capacity: usize,
    video_count: usize,
    oldest_slot: Option<usize>,
    occupied: Vec<bool>,
}

impl RingTracker {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            video_count: 0,
            oldest_slot: None,
            occupied: vec![false; capacity],
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn video_count(&self) -> usize {
        self.video_count
    }

    pub(crate) fn oldest_slot(&self) -> Option<usize> {
        self.oldest_slot
    }

    pub(crate) fn state(&self) -> RingState {
        RingState {
            video_count: self.video_count,
            oldest_slot: self.oldest_slot,
            capacity: self.capacity,
        }
    }

    pub(crate) fn check_range(&self, slot: usize) -> QueueResult<()> {
        if slot >= self.capacity {
            return Err(QueueError::SlotOutOfRange {
                slot,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Decide how an incoming slot is admitted. Never mutates.
    ///
    /// A held slot other than the oldest one means the producer reused a slot
    /// out of ring order.
    pub(crate) fn admission(&self, slot: usize, queue_size: usize) -> QueueResult<Admission> {
        self.check_range(slot)?;

        if !self.occupied[slot] {
            return Ok(Admission::Free);
        }

        match self.oldest_slot {
            Some(oldest) if oldest == slot => Ok(Admission::CatchUp),
            Some(oldest) => Err(QueueError::RingInconsistency {
                expected: oldest,
                found: Some(slot),
                queue_size,
            }),
            None => Err(QueueError::RingInconsistency {
                expected: slot,
                found: None,
                queue_size,
            }),
        }
    }

    /// Record an appended video packet
    pub(crate) fn admit(&mut self, slot: usize) {
        if self.oldest_slot.is_none() {
            self.oldest_slot = Some(slot);
        }
        self.occupied[slot] = true;
        self.video_count += 1;
        debug_assert!(self.video_count <= self.capacity);
    }

    /// Record a removed video packet, the next one in ring order becomes oldest
    pub(crate) fn retire(&mut self, slot: usize) {
        if let Some(held) = self.occupied.get_mut(slot) {
            *held = false;
        }
        self.video_count = self.video_count.saturating_sub(1);

        if self.video_count == 0 {
            self.oldest_slot = None;
        } else if let Some(oldest) = self.oldest_slot {
            self.oldest_slot = Some((oldest + 1) % self.capacity);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.video_count = 0;
        self.oldest_slot = None;
        self.occupied.fill(false);
    }
}
