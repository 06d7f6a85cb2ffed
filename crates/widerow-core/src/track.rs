use std::cell::Cell;

///
/// DirtyTracker
///
/// Per-entity-instance change-tracking state: one bit per mapped property,
/// positioned by ascending lexical order of property names, plus a separate
/// flag for wholesale replacement of the unmapped-field container.
///
/// Bits are set through `&self` (`Cell` words) so counter accessors can mark
/// on read. The tracker is therefore not `Sync`; an entity instance is owned
/// by one logical operation at a time.
///

#[derive(Clone, Debug)]
pub struct DirtyTracker {
    words: Vec<Cell<u64>>,
    len: usize,
    unmapped: Cell<bool>,
}

impl DirtyTracker {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![Cell::new(0); len.div_ceil(64)],
            len,
            unmapped: Cell::new(false),
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark one property bit dirty. Out-of-range bits indicate a metadata
    /// mismatch and are ignored outside debug builds.
    pub fn mark(&self, bit: usize) {
        debug_assert!(bit < self.len, "dirty bit {bit} out of range {}", self.len);
        if bit < self.len {
            let word = &self.words[bit / 64];
            word.set(word.get() | (1 << (bit % 64)));
        }
    }

    #[must_use]
    pub fn is_dirty(&self, bit: usize) -> bool {
        bit < self.len && self.words[bit / 64].get() & (1 << (bit % 64)) != 0
    }

    pub fn mark_unmapped(&self) {
        self.unmapped.set(true);
    }

    #[must_use]
    pub fn unmapped_dirty(&self) -> bool {
        self.unmapped.get()
    }

    #[must_use]
    pub fn any_dirty(&self) -> bool {
        self.unmapped.get() || self.words.iter().any(|w| w.get() != 0)
    }

    #[must_use]
    pub fn dirty_indices(&self) -> Vec<usize> {
        (0..self.len).filter(|&bit| self.is_dirty(bit)).collect()
    }

    /// Reset to clean: all property bits and the unmapped flag.
    pub fn clear(&self) {
        for word in &self.words {
            word.set(0);
        }
        self.unmapped.set(false);
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_is_clean() {
        let tracker = DirtyTracker::new(5);
        assert!(!tracker.any_dirty());
        assert!(tracker.dirty_indices().is_empty());
    }

    #[test]
    fn marking_the_same_bit_twice_sets_exactly_one_bit() {
        let tracker = DirtyTracker::new(5);
        tracker.mark(3);
        tracker.mark(3);
        assert_eq!(tracker.dirty_indices(), vec![3]);
    }

    #[test]
    fn bits_accumulate_until_cleared() {
        let tracker = DirtyTracker::new(130);
        tracker.mark(0);
        tracker.mark(64);
        tracker.mark(129);
        tracker.mark_unmapped();
        assert_eq!(tracker.dirty_indices(), vec![0, 64, 129]);
        assert!(tracker.unmapped_dirty());

        tracker.clear();
        assert!(!tracker.any_dirty());
        assert!(!tracker.unmapped_dirty());
    }

    #[test]
    fn unmapped_flag_is_tracked_separately() {
        let tracker = DirtyTracker::new(2);
        tracker.mark_unmapped();
        assert!(tracker.any_dirty());
        assert!(tracker.dirty_indices().is_empty());
    }
}
