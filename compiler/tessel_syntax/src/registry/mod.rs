//! The kind registry: one dense, append-only table of every kind.
//!
//! # Mental model
//!
//! * Each constructed kind takes the next index. Indices are never reused.
//! * Readers (`find`, `enumerate`, `TokenSet::get_types`) load the published
//!   table and read slots without taking any lock.
//! * Writers (`register*`, `unregister_for_owner`) serialize on one mutex.
//!   Registration is rare and bursty (language and extension startup).
//!
//! # Invariants
//!
//! * Every slot below `count()` is either live or a tombstone.
//! * A reader that observes count `n` observes a table with slots `0..n`
//!   populated: growth publishes the copied table before the count moves.
//! * Slot 0 holds the NULL kind and is never tombstoned.
//!
//! # Lifecycle
//!
//! 1. Startup: `TypeRegistry::new` (or `global()`) creates the table with NULL.
//! 2. Language definitions register their kinds.
//! 3. Extension unload: `unregister_for_owner` tombstones that owner's slots.
//!    Long-lived `TypeHandle`s stay valid; lookups by index now fail with
//!    `KindError::UnloadedReference`.

mod config;
mod overflow;
mod table;

pub use config::{RegistryConfig, INITIAL_CAPACITY_ENV, SOFT_LIMIT_ENV};
pub use overflow::{OverflowReport, OverflowSink, TracingOverflowSink};
pub use table::Tombstone;

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::common::CommonKinds;
use crate::error::KindError;
use crate::kind::{Capabilities, KindIndex, KindSpec, Language, OwnerId, TypeHandle};
use overflow::OverflowMonitor;
use table::{grown_capacity, Slot, SlotTable};

/// Writer-side bookkeeping, guarded by the registration lock.
struct WriterState {
    /// Live registrations per language, for the overflow report.
    per_language: FxHashMap<Language, usize>,
}

struct Shared {
    table: ArcSwap<SlotTable>,
    count: AtomicUsize,
    live: AtomicUsize,
    writer: Mutex<WriterState>,
    overflow: OverflowMonitor,
    config: RegistryConfig,
}

/// Process-wide table of kinds.
///
/// Cloning shares the same table. Use `TypeRegistry::global()` for the
/// process registry, or `TypeRegistry::new` for an isolated one.
#[derive(Clone)]
pub struct TypeRegistry {
    shared: Arc<Shared>,
}

static GLOBAL: OnceLock<(TypeRegistry, CommonKinds)> = OnceLock::new();

/// The process registry together with its common kinds.
///
/// Both are created in one initializer so neither accessor re-enters the other.
pub(crate) fn global_state() -> &'static (TypeRegistry, CommonKinds) {
    GLOBAL.get_or_init(|| {
        let registry = TypeRegistry::new(RegistryConfig::from_env());
        let common = CommonKinds::register(&registry);
        (registry, common)
    })
}

impl TypeRegistry {
    /// Debug name of the kind in slot 0.
    pub const NULL_NAME: &'static str = "NULL";

    /// Create a registry reporting overflow through `tracing`.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_overflow_sink(config, Arc::new(TracingOverflowSink))
    }

    /// Create a registry reporting overflow to `sink`.
    pub fn with_overflow_sink(config: RegistryConfig, sink: Arc<dyn OverflowSink>) -> Self {
        let registry = TypeRegistry {
            shared: Arc::new(Shared {
                table: ArcSwap::from_pointee(SlotTable::with_capacity(config.initial_capacity)),
                count: AtomicUsize::new(0),
                live: AtomicUsize::new(0),
                writer: Mutex::new(WriterState {
                    per_language: FxHashMap::default(),
                }),
                overflow: OverflowMonitor::new(config.soft_limit, sink),
                config,
            }),
        };
        let null = registry.register(Self::NULL_NAME, Language::ANY, Capabilities::empty());
        debug_assert_eq!(null.index(), KindIndex::NULL);
        registry
    }

    /// The process-wide registry, created on first use from
    /// `RegistryConfig::from_env()` with `CommonKinds` pre-registered.
    pub fn global() -> &'static TypeRegistry {
        &global_state().0
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.shared.config
    }

    /// Register a kind with default behavior.
    ///
    /// # Panics
    /// Panics if the index space is exhausted or the capabilities conflict.
    /// Use `try_register` for fallible registration.
    pub fn register(
        &self,
        name: impl Into<Cow<'static, str>>,
        language: Language,
        capabilities: Capabilities,
    ) -> TypeHandle {
        self.register_spec(KindSpec::new(name, language).capabilities(capabilities))
    }

    pub fn try_register(
        &self,
        name: impl Into<Cow<'static, str>>,
        language: Language,
        capabilities: Capabilities,
    ) -> Result<TypeHandle, KindError> {
        self.try_register_spec(KindSpec::new(name, language).capabilities(capabilities))
    }

    /// Register a fully described kind.
    ///
    /// # Panics
    /// Panics on the same conditions as `register`.
    pub fn register_spec(&self, spec: KindSpec) -> TypeHandle {
        self.try_register_spec(spec)
            .unwrap_or_else(|e| panic!("{}", e))
    }

    /// Register a fully described kind, assigning it the next free index.
    ///
    /// Safe to call from several threads; index assignment is serialized.
    /// Crossing the soft limit schedules one overflow report and still succeeds.
    /// A `CUSTOM_PARSING` kind must come with its custom parser.
    pub fn try_register_spec(&self, spec: KindSpec) -> Result<TypeHandle, KindError> {
        let capabilities = spec.capabilities.normalized().filter(|caps| {
            !caps.contains(Capabilities::CUSTOM_PARSING) || spec.custom_parser.is_some()
        });
        let Some(capabilities) = capabilities else {
            return Err(KindError::InvalidCapabilities {
                name: spec.name,
                capabilities: spec.capabilities,
            });
        };

        let (handle, report) = {
            let mut writer = self.shared.writer.lock();
            let count = self.shared.count.load(Ordering::Relaxed);
            let raw = u16::try_from(count)
                .ok()
                .filter(|raw| *raw <= KindIndex::MAX.raw())
                .ok_or(KindError::Exhausted {
                    limit: KindIndex::MAX.index() + 1,
                })?;

            let handle = TypeHandle::from_spec(KindIndex::new(raw), spec, capabilities);
            let table = self.table_for(count);
            table.store(count, Slot::Live(handle.clone()));
            // Publish the slot before the count that makes it visible.
            self.shared.count.store(count + 1, Ordering::Release);

            *writer
                .per_language
                .entry(handle.language().clone())
                .or_default() += 1;
            let live = self.shared.live.fetch_add(1, Ordering::Relaxed) + 1;
            let report = self.shared.overflow.check(live, &writer.per_language);
            (handle, report)
        };

        debug!(
            index = handle.index().raw(),
            kind = %handle,
            language = %handle.language(),
            owner = %handle.owner(),
            "registered kind"
        );
        if let Some(report) = report {
            self.shared.overflow.dispatch(report);
        }
        Ok(handle)
    }

    /// Table with room for slot `count`, growing and publishing if needed.
    ///
    /// Writer lock must be held.
    fn table_for(&self, count: usize) -> Arc<SlotTable> {
        let current = self.shared.table.load_full();
        if count < current.capacity() {
            return current;
        }
        let capacity = grown_capacity(current.capacity(), count + 1);
        let grown = Arc::new(current.grown(count, capacity));
        self.shared.table.store(Arc::clone(&grown));
        trace!(from = current.capacity(), to = capacity, "grew kind table");
        grown
    }

    /// Build a handle that is never registered. See `TypeHandle::unregistered`.
    pub fn construct_unregistered(
        &self,
        name: impl Into<Cow<'static, str>>,
        language: Language,
    ) -> TypeHandle {
        TypeHandle::unregistered(name, language)
    }

    /// Look up a kind by index. O(1), lock-free.
    pub fn find(&self, index: usize) -> Result<TypeHandle, KindError> {
        let count = self.shared.count.load(Ordering::Acquire);
        if index >= count {
            return Err(KindError::IndexOutOfRange { index, count });
        }
        let table = self.shared.table.load();
        match table.load(index).as_deref() {
            Some(Slot::Live(handle)) => Ok(handle.clone()),
            Some(Slot::Tombstone(tombstone)) => {
                debug!(index, kind = %tombstone.debug_name, owner = %tombstone.owner, "lookup of unloaded kind");
                Err(KindError::UnloadedReference {
                    index,
                    debug_name: tombstone.debug_name.clone(),
                    owner: tombstone.owner.clone(),
                })
            }
            // Unreachable while the publication order holds.
            None => Err(KindError::IndexOutOfRange { index, count }),
        }
    }

    /// Snapshot scan of all live kinds matching `predicate`, in index order.
    ///
    /// May run concurrently with registration; the result covers a
    /// consistent prefix of the table.
    pub fn enumerate(&self, mut predicate: impl FnMut(&TypeHandle) -> bool) -> Vec<TypeHandle> {
        let count = self.shared.count.load(Ordering::Acquire);
        let table = self.shared.table.load_full();
        (0..count)
            .filter_map(|index| match table.load(index).as_deref() {
                Some(Slot::Live(handle)) if predicate(handle) => Some(handle.clone()),
                _ => None,
            })
            .collect()
    }

    /// Tombstone every live kind registered by `owner`.
    ///
    /// Indices stay reserved. Returns the number of slots tombstoned.
    pub fn unregister_for_owner(&self, owner: &OwnerId) -> usize {
        let mut writer = self.shared.writer.lock();
        let count = self.shared.count.load(Ordering::Relaxed);
        let table = self.shared.table.load_full();
        let mut removed = 0;

        for index in 1..count {
            let Some(slot) = table.load(index) else {
                continue;
            };
            let Slot::Live(handle) = &*slot else {
                continue;
            };
            if handle.owner() != owner {
                continue;
            }
            if let Some(n) = writer.per_language.get_mut(handle.language()) {
                *n = n.saturating_sub(1);
            }
            let tombstone = Tombstone {
                owner: owner.clone(),
                debug_name: handle.debug_name_cow().clone(),
                reason: Cow::Owned(format!("owner `{owner}` was unloaded")),
            };
            table.store(index, Slot::Tombstone(tombstone));
            removed += 1;
        }

        self.shared.live.fetch_sub(removed, Ordering::Relaxed);
        drop(writer);
        debug!(owner = %owner, removed, "unregistered kinds");
        removed
    }

    /// Number of assigned indices (live and tombstoned, NULL included).
    pub fn count(&self) -> usize {
        self.shared.count.load(Ordering::Acquire)
    }

    /// Number of live kinds.
    pub fn live_count(&self) -> usize {
        self.shared.live.load(Ordering::Relaxed)
    }

    /// Whether slot `index` was unloaded.
    pub fn is_tombstone(&self, index: usize) -> bool {
        self.tombstone(index).is_some()
    }

    /// The tombstone in slot `index`, if that slot was unloaded.
    pub fn tombstone(&self, index: usize) -> Option<Tombstone> {
        if index >= self.count() {
            return None;
        }
        match self.shared.table.load().load(index).as_deref() {
            Some(Slot::Tombstone(tombstone)) => Some(tombstone.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("count", &self.count())
            .field("live", &self.live_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
