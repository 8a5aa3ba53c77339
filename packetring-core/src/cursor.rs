//! Analysis read cursor
//!
//! Queued entries carry consecutive sequence numbers, so the cursor is just
//! the sequence number of the packet it addresses. Its index in the store is
//! `seq - front_seq`, which keeps every cursor operation O(1) and lets removal
//! at the head relocate it without touching the rest of the queue.
//!
//! When the cursor equals the next sequence number to be assigned it sits on
//! the pending position: nothing to analyse yet, and the next enqueued packet
//! becomes visible to it without further bookkeeping. An empty queue always
//! leaves the cursor there, which is the conceptual head.

#[derive(Debug, Default)]
pub(crate) struct AnalysisCursor {
    seq: u64,
}

impl AnalysisCursor {
    /// Index of the addressed packet relative to the store head
    pub(crate) fn offset(&self, front_seq: u64) -> usize {
        debug_assert!(self.seq >= front_seq);
        (self.seq - front_seq) as usize
    }

    /// Move past the addressed packet.
    ///
    /// Returns whether the cursor now addresses another queued packet.
    pub(crate) fn advance(&mut self, front_seq: u64, len: usize) -> bool {
        let offset = self.offset(front_seq);
        if offset >= len {
            return false;
        }

        self.seq += 1;
        offset + 1 < len
    }

    /// Called before the head entry with sequence `removed` leaves the store.
    ///
    /// Returns true when the cursor had to be pushed forward, i.e. analysis
    /// never looked at the removed packet.
    pub(crate) fn on_head_removed(&mut self, removed: u64) -> bool {
        if self.seq == removed {
            self.seq += 1;
            return true;
        }
        false
    }

    pub(crate) fn reset(&mut self, head_seq: u64) {
        self.seq = head_seq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_stops_at_pending_position() {
        let mut cursor = AnalysisCursor::default();

        assert!(cursor.advance(0, 2));
        assert_eq!(cursor.offset(0), 1);

        assert!(!cursor.advance(0, 2));
        assert_eq!(cursor.offset(0), 2);

        // Nothing more to move past
        assert!(!cursor.advance(0, 2));
        assert_eq!(cursor.offset(0), 2);
    }

    #[test]
    fn test_head_removal_pushes_cursor() {
        let mut cursor = AnalysisCursor::default();
        cursor.reset(5);

        assert!(!cursor.on_head_removed(4));
        assert!(cursor.on_head_removed(5));
        assert_eq!(cursor.offset(6), 0);
    }

    #[test]
    fn test_empty_store_never_moves() {
        let mut cursor = AnalysisCursor::default();
        assert!(!cursor.advance(0, 0));
        assert_eq!(cursor.offset(0), 0);
    }
}
