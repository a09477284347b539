//! Thread-safe counter handing out vector slots.
//!
//! Slots are global across languages and strictly increasing, so they double
//! as the insertion order of documents.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::vector::VectorSlot;

#[derive(Debug, Default)]
pub struct SlotCounter {
    next: AtomicU32,
}

impl SlotCounter {
    /// Creates a new counter starting at slot 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn from_value(next: u32) -> Self {
        Self {
            next: AtomicU32::new(next),
        }
    }

    /// Claims the next slot.
    ///
    /// Returns `None` once the u32 space is exhausted; the counter is left
    /// unchanged in that case.
    pub fn next_slot(&self) -> Option<VectorSlot> {
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1))
            .ok()
            .map(VectorSlot::new)
    }

    /// Number of slots handed out so far.
    #[must_use]
    pub fn current_count(&self) -> u32 {
        self.next.load(Ordering::Acquire)
    }

    /// Moves the counter forward so it never reissues `slot`.
    pub fn advance_past(&self, slot: VectorSlot) {
        let floor = slot.get().saturating_add(1);
        self.next.fetch_max(floor, Ordering::AcqRel);
    }
}
