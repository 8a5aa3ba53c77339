//! Queue statistics

use serde::{Deserialize, Serialize};

/// Why a packet left the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    /// Handed to the recording consumer
    Popped,
    /// Evicted because the producer wrapped onto a held slot
    CatchUp,
    /// Evicted by keyframe-window trimming
    Trimmed,
    /// Discarded by a full flush
    Flushed,
}

/// Cumulative counters for a queue instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Packets accepted by `enqueue`
    pub packets_enqueued: u64,
    /// Packets returned by `pop_head`
    pub packets_popped: u64,
    /// Packets evicted to free a wrapped ring slot
    pub catch_up_evictions: u64,
    /// Packets evicted by retention trimming
    pub trim_evictions: u64,
    /// Packets discarded by `flush_all`
    pub packets_flushed: u64,
    /// Packets removed before analysis reached them
    pub unanalysed_removals: u64,
    /// Trims that kept everything because no keyframe was available
    pub keyframe_fallbacks: u64,
    /// Packets rejected by `enqueue`
    pub rejected_packets: u64,
    /// Largest queue length observed
    pub peak_queue_len: usize,
}

impl QueueStats {
    pub(crate) fn record_enqueue(&mut self, queue_len: usize) {
        self.packets_enqueued += 1;
        self.peak_queue_len = self.peak_queue_len.max(queue_len);
    }

    pub(crate) fn record_removal(&mut self, removal: Removal, unanalysed: bool) {
        match removal {
            Removal::Popped => self.packets_popped += 1,
            Removal::CatchUp => self.catch_up_evictions += 1,
            Removal::Trimmed => self.trim_evictions += 1,
            Removal::Flushed => self.packets_flushed += 1,
        }
        if unanalysed {
            self.unanalysed_removals += 1;
        }
    }

    /// Total packets that left the queue by any path
    pub fn packets_removed(&self) -> u64 {
        self.packets_popped + self.catch_up_evictions + self.trim_evictions + self.packets_flushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removals_are_bucketed() {
        let mut stats = QueueStats::default();
        stats.record_enqueue(1);
        stats.record_enqueue(2);
        stats.record_enqueue(3);
        stats.record_removal(Removal::Popped, false);
        stats.record_removal(Removal::CatchUp, true);
        stats.record_removal(Removal::Trimmed, true);

        assert_eq!(stats.packets_enqueued, 3);
        assert_eq!(stats.peak_queue_len, 3);
        assert_eq!(stats.packets_removed(), 3);
        assert_eq!(stats.unanalysed_removals, 2);
    }
}
