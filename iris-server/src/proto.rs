//! Wire messages for the live settings RPC.
//!
//! Sentinel encoding follows proto3 scalar defaults: for the strictly
//! positive settings an absent field decodes to 0, so 0 doubles as "leave
//! unchanged". For the settings where 0 is itself a legal value the
//! no-change sentinel is any negative number, and clients that want no
//! change must send one explicitly (see `LiveSettingsRequest::no_change`).

/// Partial update of one index's live settings.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LiveSettingsRequest {
    /// Index to update.
    #[prost(string, tag = "1")]
    pub index_name: String,
    /// Max seconds between searcher refreshes. 0 = no change.
    /// Installed together with min_refresh_sec when either is set.
    #[prost(double, tag = "2")]
    pub max_refresh_sec: f64,
    /// Min seconds between searcher refreshes. 0 = no change.
    /// Installed together with max_refresh_sec when either is set.
    #[prost(double, tag = "3")]
    pub min_refresh_sec: f64,
    /// Max age of an open searcher, seconds. 0 = no change.
    #[prost(double, tag = "4")]
    pub max_searcher_age_sec: f64,
    /// Writer RAM buffer size, MB. 0 = no change.
    #[prost(double, tag = "5")]
    pub index_ram_buffer_size_mb: f64,
    /// Max queued documents per addDocuments call. 0 = no change.
    #[prost(int32, tag = "6")]
    pub add_documents_max_buffer_len: i32,
    /// Max documents per parallel search slice. 0 = no change.
    #[prost(int32, tag = "7")]
    pub slice_max_docs: i32,
    /// Max segments per parallel search slice. 0 = no change.
    #[prost(int32, tag = "8")]
    pub slice_max_segments: i32,
    /// Virtual shards for this index. 0 = no change.
    #[prost(int32, tag = "9")]
    pub virtual_shards: i32,
    /// Max merged segment size, MB. 0 = no change.
    #[prost(int32, tag = "10")]
    pub max_merged_segment_mb: i32,
    /// Segments per tier of the merge policy. 0 = no change.
    #[prost(int32, tag = "11")]
    pub segments_per_tier: i32,
    /// Deleted-document percentage tolerated by merges. 0 = no change.
    #[prost(double, tag = "12")]
    pub delete_pct_allowed: f64,
    /// Search timeout, seconds; 0 is a legal value (disable the timeout).
    /// Negative = no change.
    #[prost(double, tag = "13")]
    pub default_search_timeout_sec: f64,
    /// Docs scored between timeout checks; 0 is a legal value.
    /// Negative = no change.
    #[prost(int32, tag = "14")]
    pub default_search_timeout_check_every: i32,
    /// Hits collected before early termination; 0 is a legal value (off).
    /// Negative = no change.
    #[prost(int32, tag = "15")]
    pub default_terminate_after: i32,
    /// Recall floor for early termination; 0 is a legal value.
    /// Negative = no change.
    #[prost(int32, tag = "16")]
    pub default_terminate_after_max_recall_count: i32,
}

impl LiveSettingsRequest {
    /// Request that changes nothing: every field at its no-change sentinel.
    /// Applying it reads the current settings back.
    pub fn no_change(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            default_search_timeout_sec: -1.0,
            default_search_timeout_check_every: -1,
            default_terminate_after: -1,
            default_terminate_after_max_recall_count: -1,
            ..Default::default()
        }
    }
}

/// Rendered form of the settings that ended up installed.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LiveSettingsResponse {
    /// Canonical JSON rendering of the installed snapshot's explicit
    /// settings, in fixed field order, unset fields omitted.
    #[prost(string, tag = "1")]
    pub response: String,
}
