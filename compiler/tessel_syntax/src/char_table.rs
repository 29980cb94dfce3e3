//! Sharded intern table for token text.
//!
//! Source files repeat the same short texts (keywords, operators, single
//! spaces) thousands of times. Leaves share one allocation per distinct text
//! up to `MAX_CACHED_LEN` bytes; longer texts get their own allocation.
//!
//! # Thread Safety
//! Uses an `RwLock` per shard. One table is typically shared by every parse
//! of a document and handed to custom parse functions.

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared text of a leaf node.
pub type TokenText = Arc<str>;

const NUM_SHARDS: usize = 16;

/// Sharded table of interned token texts.
pub struct CharTable {
    shards: [RwLock<FxHashSet<TokenText>>; NUM_SHARDS],
    /// Total count of interned texts across all shards (O(1) `len()`).
    total_count: AtomicUsize,
}

impl CharTable {
    /// Texts longer than this are not interned.
    pub const MAX_CACHED_LEN: usize = 32;

    pub fn new() -> Self {
        CharTable {
            shards: std::array::from_fn(|_| RwLock::new(FxHashSet::default())),
            total_count: AtomicUsize::new(0),
        }
    }

    /// Compute shard for a text based on its leading bytes.
    #[inline]
    fn shard_for(s: &str) -> usize {
        let mut hash = 0u32;
        for byte in s.bytes().take(8) {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (hash as usize) % NUM_SHARDS
    }

    /// Intern `text`, returning a shared handle.
    pub fn intern(&self, text: &str) -> TokenText {
        if text.len() > Self::MAX_CACHED_LEN {
            return Arc::from(text);
        }
        let shard = &self.shards[Self::shard_for(text)];

        // Fast path: check if already interned
        if let Some(existing) = shard.read().get(text) {
            return Arc::clone(existing);
        }

        // Slow path: double-check after acquiring write lock
        let mut guard = shard.write();
        if let Some(existing) = guard.get(text) {
            return Arc::clone(existing);
        }
        let interned: TokenText = Arc::from(text);
        guard.insert(Arc::clone(&interned));
        self.total_count.fetch_add(1, Ordering::Relaxed);
        interned
    }

    /// Number of distinct interned texts (O(1)).
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CharTable {
    fn default() -> Self {
        Self::new()
    }
}
