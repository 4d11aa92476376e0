//! Live settings snapshot — the mutable-at-runtime tuning values of one index.
//!
//! A `LiveSettings` value is sparse: every field is an `Option`, where `None`
//! means no explicit value has ever been installed for that field and readers
//! fall back to the default at resolution time. Values are never mutated in
//! place; `merged` produces the value set for the next snapshot.
//!
//! Wire names are camelCase for compatibility with the settings JSON served
//! to clients and persisted on disk.

use serde::{Deserialize, Serialize};

/// Default values applied when a field has no explicit setting.
pub mod defaults {
    /// Max seconds between searcher refreshes.
    pub const MAX_REFRESH_SEC: f64 = 1.0;
    /// Min seconds between searcher refreshes.
    pub const MIN_REFRESH_SEC: f64 = 0.05;
    /// Max age of an open searcher before it is pruned.
    pub const MAX_SEARCHER_AGE_SEC: f64 = 60.0;
    /// Writer RAM buffer size, MB.
    pub const INDEX_RAM_BUFFER_SIZE_MB: f64 = 16.0;
    /// Max queued documents per addDocuments call.
    pub const ADD_DOCUMENTS_MAX_BUFFER_LEN: i32 = 100;
    /// Max documents per parallel search slice.
    pub const SLICE_MAX_DOCS: i32 = 250_000;
    /// Max segments per parallel search slice.
    pub const SLICE_MAX_SEGMENTS: i32 = 5;
    /// Virtual shards for this index.
    pub const VIRTUAL_SHARDS: i32 = 1;
    /// Max merged segment size, MB.
    pub const MAX_MERGED_SEGMENT_MB: i32 = 5120;
    /// Segments per tier of the tiered merge policy.
    pub const SEGMENTS_PER_TIER: i32 = 10;
    /// Deleted-document percentage tolerated before merges reclaim space.
    pub const DELETE_PCT_ALLOWED: f64 = 20.0;
    /// Search timeout, seconds. 0 disables the timeout.
    pub const DEFAULT_SEARCH_TIMEOUT_SEC: f64 = 0.0;
    /// Docs scored between timeout checks. 0 leaves it to the collector.
    pub const DEFAULT_SEARCH_TIMEOUT_CHECK_EVERY: i32 = 0;
    /// Hits collected before early termination. 0 disables it.
    pub const DEFAULT_TERMINATE_AFTER: i32 = 0;
    /// Recall floor for early termination. 0 disables it.
    pub const DEFAULT_TERMINATE_AFTER_MAX_RECALL_COUNT: i32 = 0;
}

/// Explicitly installed live settings of one index.
///
/// `None` = unset (resolved from `defaults` by readers). Field order is the
/// canonical rendering order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_refresh_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_refresh_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_searcher_age_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_ram_buffer_size_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_documents_max_buffer_len: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_max_docs: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_max_segments: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_shards: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_merged_segment_mb: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments_per_tier: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_pct_allowed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_search_timeout_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_search_timeout_check_every: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_terminate_after: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_terminate_after_max_recall_count: Option<i32>,
}

impl LiveSettings {
    /// True if no field is explicitly set.
    pub fn is_empty(&self) -> bool {
        *self == LiveSettings::default()
    }

    /// Field-wise merge: explicit values in `overrides` win, everything else
    /// carries over from `self`.
    pub fn merged(&self, overrides: &LiveSettings) -> LiveSettings {
        LiveSettings {
            max_refresh_sec: overrides.max_refresh_sec.or(self.max_refresh_sec),
            min_refresh_sec: overrides.min_refresh_sec.or(self.min_refresh_sec),
            max_searcher_age_sec: overrides.max_searcher_age_sec.or(self.max_searcher_age_sec),
            index_ram_buffer_size_mb: overrides
                .index_ram_buffer_size_mb
                .or(self.index_ram_buffer_size_mb),
            add_documents_max_buffer_len: overrides
                .add_documents_max_buffer_len
                .or(self.add_documents_max_buffer_len),
            slice_max_docs: overrides.slice_max_docs.or(self.slice_max_docs),
            slice_max_segments: overrides.slice_max_segments.or(self.slice_max_segments),
            virtual_shards: overrides.virtual_shards.or(self.virtual_shards),
            max_merged_segment_mb: overrides
                .max_merged_segment_mb
                .or(self.max_merged_segment_mb),
            segments_per_tier: overrides.segments_per_tier.or(self.segments_per_tier),
            delete_pct_allowed: overrides.delete_pct_allowed.or(self.delete_pct_allowed),
            default_search_timeout_sec: overrides
                .default_search_timeout_sec
                .or(self.default_search_timeout_sec),
            default_search_timeout_check_every: overrides
                .default_search_timeout_check_every
                .or(self.default_search_timeout_check_every),
            default_terminate_after: overrides
                .default_terminate_after
                .or(self.default_terminate_after),
            default_terminate_after_max_recall_count: overrides
                .default_terminate_after_max_recall_count
                .or(self.default_terminate_after_max_recall_count),
        }
    }
}
