//! Published slot table.
//!
//! Readers pin the current `SlotTable` and read slots without locking.
//! Growth copies every populated slot into a larger table and publishes it
//! before the new count becomes visible, so a reader that observes count `n`
//! always finds slots `0..n` populated.

use std::borrow::Cow;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::kind::{OwnerId, TypeHandle};

/// What remains in a slot after its owner was unloaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tombstone {
    pub owner: OwnerId,
    pub debug_name: Cow<'static, str>,
    pub reason: Cow<'static, str>,
}

/// Content of one populated registry slot.
pub(crate) enum Slot {
    Live(TypeHandle),
    Tombstone(Tombstone),
}

pub(crate) struct SlotTable {
    slots: Box<[ArcSwapOption<Slot>]>,
}

impl SlotTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        SlotTable {
            slots: (0..capacity).map(|_| ArcSwapOption::empty()).collect(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Copy the first `populated` slots into a table of `capacity` slots.
    pub(crate) fn grown(&self, populated: usize, capacity: usize) -> Self {
        debug_assert!(capacity >= populated && populated <= self.capacity());
        let slots = (0..capacity)
            .map(|i| {
                if i < populated {
                    ArcSwapOption::new(self.slots[i].load_full())
                } else {
                    ArcSwapOption::empty()
                }
            })
            .collect();
        SlotTable { slots }
    }

    #[inline]
    pub(crate) fn load(&self, index: usize) -> Option<Arc<Slot>> {
        self.slots.get(index).and_then(|slot| slot.load_full())
    }

    /// Writers only.
    #[inline]
    pub(crate) fn store(&self, index: usize, slot: Slot) {
        self.slots[index].store(Some(Arc::new(slot)));
    }
}

/// Amortized growth: ×1.5, at least `needed`.
pub(crate) fn grown_capacity(current: usize, needed: usize) -> usize {
    (current + current / 2).max(needed).max(4)
}
