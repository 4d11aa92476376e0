//! Per-index state — immutable snapshots behind a single-writer manager.
//!
//! Architecture:
//! - **Immutable snapshots**: an `IndexState` is never mutated; every install
//!   builds a new snapshot and publishes it with one pointer swap.
//! - **Single writer per index**: all installs for an index serialize through
//!   the manager's update mutex, held across the whole
//!   read-current → merge → install cycle.
//! - **Lock-free readers**: `current()` loads the snapshot pointer through
//!   `ArcSwap`; readers outside the critical section take no lock and can
//!   never observe a half-applied settings change.
//!
//! # Locking model
//!
//! ```text
//! update_lock — parking_lot::Mutex, blocking, held for merge + store I/O
//! current     — arc_swap::ArcSwap, lock-free reads, replaced only while
//!               update_lock is held
//! ```
//!
//! **Rule:** the snapshot pointer is only stored through a
//! `SettingsWriteGuard`, so "install requires the lock" is enforced by the
//! type system rather than by convention.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::live_settings::{LiveSettings, defaults};
use crate::store::SettingsStore;

/// Immutable snapshot of one index's live state at one point in time.
///
/// Accessors resolve unset fields to their defaults, so readers never see
/// the sparse encoding.
#[derive(Debug, Clone)]
pub struct IndexState {
    name: String,
    generation: u64,
    settings: LiveSettings,
}

impl IndexState {
    pub fn new(name: impl Into<String>, settings: LiveSettings) -> Self {
        Self {
            name: name.into(),
            generation: 0,
            settings,
        }
    }

    /// Successor snapshot holding `settings`.
    fn next(&self, settings: LiveSettings) -> Self {
        Self {
            name: self.name.clone(),
            generation: self.generation + 1,
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install counter; increments on every successful install.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The explicitly installed settings (sparse; unset fields omitted).
    pub fn settings(&self) -> &LiveSettings {
        &self.settings
    }

    pub fn max_refresh_sec(&self) -> f64 {
        self.settings
            .max_refresh_sec
            .unwrap_or(defaults::MAX_REFRESH_SEC)
    }

    pub fn min_refresh_sec(&self) -> f64 {
        self.settings
            .min_refresh_sec
            .unwrap_or(defaults::MIN_REFRESH_SEC)
    }

    pub fn max_searcher_age_sec(&self) -> f64 {
        self.settings
            .max_searcher_age_sec
            .unwrap_or(defaults::MAX_SEARCHER_AGE_SEC)
    }

    pub fn index_ram_buffer_size_mb(&self) -> f64 {
        self.settings
            .index_ram_buffer_size_mb
            .unwrap_or(defaults::INDEX_RAM_BUFFER_SIZE_MB)
    }

    pub fn add_documents_max_buffer_len(&self) -> i32 {
        self.settings
            .add_documents_max_buffer_len
            .unwrap_or(defaults::ADD_DOCUMENTS_MAX_BUFFER_LEN)
    }

    pub fn slice_max_docs(&self) -> i32 {
        self.settings.slice_max_docs.unwrap_or(defaults::SLICE_MAX_DOCS)
    }

    pub fn slice_max_segments(&self) -> i32 {
        self.settings
            .slice_max_segments
            .unwrap_or(defaults::SLICE_MAX_SEGMENTS)
    }

    pub fn virtual_shards(&self) -> i32 {
        self.settings.virtual_shards.unwrap_or(defaults::VIRTUAL_SHARDS)
    }

    pub fn max_merged_segment_mb(&self) -> i32 {
        self.settings
            .max_merged_segment_mb
            .unwrap_or(defaults::MAX_MERGED_SEGMENT_MB)
    }

    pub fn segments_per_tier(&self) -> i32 {
        self.settings
            .segments_per_tier
            .unwrap_or(defaults::SEGMENTS_PER_TIER)
    }

    pub fn delete_pct_allowed(&self) -> f64 {
        self.settings
            .delete_pct_allowed
            .unwrap_or(defaults::DELETE_PCT_ALLOWED)
    }

    pub fn default_search_timeout_sec(&self) -> f64 {
        self.settings
            .default_search_timeout_sec
            .unwrap_or(defaults::DEFAULT_SEARCH_TIMEOUT_SEC)
    }

    pub fn default_search_timeout_check_every(&self) -> i32 {
        self.settings
            .default_search_timeout_check_every
            .unwrap_or(defaults::DEFAULT_SEARCH_TIMEOUT_CHECK_EVERY)
    }

    pub fn default_terminate_after(&self) -> i32 {
        self.settings
            .default_terminate_after
            .unwrap_or(defaults::DEFAULT_TERMINATE_AFTER)
    }

    pub fn default_terminate_after_max_recall_count(&self) -> i32 {
        self.settings
            .default_terminate_after_max_recall_count
            .unwrap_or(defaults::DEFAULT_TERMINATE_AFTER_MAX_RECALL_COUNT)
    }
}

/// Owner of one index's current snapshot.
///
/// SOLE publisher of the snapshot pointer. All installs go through `write()`.
pub struct IndexStateManager {
    name: String,
    /// Current snapshot — lock-free reads via ArcSwap.
    current: ArcSwap<IndexState>,
    /// Serializes read-merge-install cycles.
    update_lock: Mutex<()>,
    store: Arc<dyn SettingsStore>,
}

impl std::fmt::Debug for IndexStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStateManager")
            .field("name", &self.name)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl IndexStateManager {
    /// Manager for a fresh index with no explicit settings.
    pub fn new(name: impl Into<String>, store: Arc<dyn SettingsStore>) -> Self {
        let name = name.into();
        Self {
            current: ArcSwap::from_pointee(IndexState::new(&name, LiveSettings::default())),
            update_lock: Mutex::new(()),
            store,
            name,
        }
    }

    /// Manager for an existing index, loading its saved explicit settings.
    /// A missing settings file yields the all-unset snapshot.
    pub fn open(name: impl Into<String>, store: Arc<dyn SettingsStore>) -> Result<Self> {
        let name = name.into();
        let settings = store.load(&name)?.unwrap_or_default();
        Ok(Self {
            current: ArcSwap::from_pointee(IndexState::new(&name, settings)),
            update_lock: Mutex::new(()),
            store,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current snapshot (lock-free).
    ///
    /// Callers outside a write guard may observe either the pre- or
    /// post-install snapshot of a concurrent update, never a torn one.
    pub fn current(&self) -> Arc<IndexState> {
        self.current.load_full()
    }

    /// Acquire exclusive write access to this index's settings.
    ///
    /// Blocks until any in-flight install for the same index completes; a
    /// caller that blocked here observes the post-install snapshot as its
    /// current. Managers of different indices never contend.
    pub fn write(&self) -> SettingsWriteGuard<'_> {
        SettingsWriteGuard {
            _lock: self.update_lock.lock(),
            manager: self,
        }
    }
}

/// Exclusive write access to one index's settings.
///
/// Holding the guard keeps the read-merge-install cycle atomic with respect
/// to other writers; the lock is released on every exit path when the guard
/// drops.
pub struct SettingsWriteGuard<'a> {
    manager: &'a IndexStateManager,
    _lock: MutexGuard<'a, ()>,
}

impl SettingsWriteGuard<'_> {
    /// The snapshot this install cycle starts from. Stable for the lifetime
    /// of the guard.
    pub fn current(&self) -> Arc<IndexState> {
        self.manager.current.load_full()
    }

    /// Install a new snapshot: merge `overrides` onto the current explicit
    /// settings, persist them, then publish with a single pointer swap.
    ///
    /// All-or-nothing: if persistence fails nothing is published and the
    /// prior snapshot stays authoritative, so a retry is safe. `ephemeral`
    /// skips persistence, applying the snapshot to this process only.
    pub fn install(&self, overrides: &LiveSettings, ephemeral: bool) -> Result<Arc<IndexState>> {
        let prev = self.manager.current.load_full();
        let merged = prev.settings().merged(overrides);

        if !ephemeral {
            self.manager
                .store
                .save(&self.manager.name, &merged)
                .map_err(|e| Error::Install(e.to_string()))?;
        }

        let next = Arc::new(prev.next(merged));
        self.manager.current.store(Arc::clone(&next));
        log::debug!(
            "[live_settings] {} installed generation {}",
            self.manager.name,
            next.generation()
        );
        Ok(next)
    }
}
