//! Keyframe-aligned retention planning
//!
//! Planning is a read-only scan over the queued packets, oldest first. The
//! queue then evicts the planned number of packets from the head through its
//! regular removal path.

use crate::packet::Packet;
use std::time::SystemTime;

/// Outcome of a retention scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrimPlan {
    /// Queue is too short for trimming to be worthwhile
    NothingToTrim,
    /// Keep everything from this index onward
    KeepFrom(usize),
    /// The whole queue holds fewer stream packets than requested
    Shortfall {
        /// Stream packets still missing after reaching the head
        missing: usize,
    },
    /// No keyframe found at or before the boundary
    NoKeyframe,
}

impl TrimPlan {
    /// Number of packets to evict from the head
    pub(crate) fn evict_count(&self) -> usize {
        match self {
            TrimPlan::KeepFrom(index) => *index,
            _ => 0,
        }
    }
}

/// Plan a window holding the last `frames_to_keep` packets of `stream_id`,
/// extended back to the nearest keyframe of that stream.
///
/// The scan walks from the tail toward the head. Once `frames_to_keep` stream
/// packets are counted, the last counted packet and everything older is
/// searched for a keyframe, which becomes the new head.
pub(crate) fn plan_keyframe_window<'a, T: 'a>(
    packets: impl DoubleEndedIterator<Item = &'a Packet<T>> + ExactSizeIterator,
    frames_to_keep: usize,
    stream_id: u32,
) -> TrimPlan {
    let len = packets.len();
    if len <= frames_to_keep.saturating_add(1) {
        return TrimPlan::NothingToTrim;
    }

    let mut remaining = frames_to_keep;
    for (index, packet) in packets.enumerate().rev() {
        if remaining > 0 {
            if packet.stream_id != stream_id {
                continue;
            }
            remaining -= 1;
            if remaining > 0 {
                continue;
            }
        }

        if packet.is_keyframe_of(stream_id) {
            return TrimPlan::KeepFrom(index);
        }
    }

    if remaining > 0 {
        TrimPlan::Shortfall { missing: remaining }
    } else {
        TrimPlan::NoKeyframe
    }
}

/// Plan the start of a recording: keep from the latest keyframe of
/// `stream_id` captured at or before `recording_start`.
pub(crate) fn plan_recording_start<'a, T: 'a>(
    packets: impl DoubleEndedIterator<Item = &'a Packet<T>> + ExactSizeIterator,
    recording_start: SystemTime,
    stream_id: u32,
) -> TrimPlan {
    if packets.len() == 0 {
        return TrimPlan::NothingToTrim;
    }

    packets
        .enumerate()
        .rev()
        .find(|(_, packet)| {
            packet.is_keyframe_of(stream_id) && packet.captured_at <= recording_start
        })
        .map(|(index, _)| TrimPlan::KeepFrom(index))
        .unwrap_or(TrimPlan::NoKeyframe)
}
