//! Live settings service implementation
//!
//! Applies a partial update to an index's live settings without closing or
//! reloading the index. The update pipeline decodes the sentinel-encoded
//! request into a sparse override set, then takes the index's write lock to
//! read the current snapshot, complete the coupled refresh-bound pair from
//! it, and install. The installed snapshot is rendered back as the response.

use std::sync::Arc;

use log::{debug, info};
use tonic::{Request, Response, Status};

use iris_core::{IndexState, LiveSettings};

use crate::error::core_error_to_status;
use crate::proto::{LiveSettingsRequest, LiveSettingsResponse};
use crate::registry::IndexRegistry;

/// Collect the explicitly requested overrides from a raw request.
///
/// Pure function of the request: strictly positive fields are requested iff
/// nonzero, zero-inclusive fields iff non-negative. A field the caller left
/// at its sentinel never appears in the output, even if its current value
/// happens to equal the sentinel. The refresh-bound pair is completed later,
/// by `resolve_refresh_bounds`, because completing it needs the current
/// snapshot and must happen under the lock.
fn requested_overrides(req: &LiveSettingsRequest) -> LiveSettings {
    LiveSettings {
        max_refresh_sec: (req.max_refresh_sec != 0.0).then_some(req.max_refresh_sec),
        min_refresh_sec: (req.min_refresh_sec != 0.0).then_some(req.min_refresh_sec),
        max_searcher_age_sec: (req.max_searcher_age_sec != 0.0).then_some(req.max_searcher_age_sec),
        index_ram_buffer_size_mb: (req.index_ram_buffer_size_mb != 0.0)
            .then_some(req.index_ram_buffer_size_mb),
        add_documents_max_buffer_len: (req.add_documents_max_buffer_len != 0)
            .then_some(req.add_documents_max_buffer_len),
        slice_max_docs: (req.slice_max_docs != 0).then_some(req.slice_max_docs),
        slice_max_segments: (req.slice_max_segments != 0).then_some(req.slice_max_segments),
        virtual_shards: (req.virtual_shards != 0).then_some(req.virtual_shards),
        max_merged_segment_mb: (req.max_merged_segment_mb != 0)
            .then_some(req.max_merged_segment_mb),
        segments_per_tier: (req.segments_per_tier != 0).then_some(req.segments_per_tier),
        delete_pct_allowed: (req.delete_pct_allowed != 0.0).then_some(req.delete_pct_allowed),
        default_search_timeout_sec: (req.default_search_timeout_sec >= 0.0)
            .then_some(req.default_search_timeout_sec),
        default_search_timeout_check_every: (req.default_search_timeout_check_every >= 0)
            .then_some(req.default_search_timeout_check_every),
        default_terminate_after: (req.default_terminate_after >= 0)
            .then_some(req.default_terminate_after),
        default_terminate_after_max_recall_count: (req.default_terminate_after_max_recall_count
            >= 0)
            .then_some(req.default_terminate_after_max_recall_count),
    }
}

/// Complete the coupled refresh-bound pair against the current snapshot.
///
/// If either bound was requested, both are installed together; the bound the
/// caller left at its sentinel is pinned to the current effective value, so
/// the pair can never be half-updated. Must run while the caller holds the
/// index's write lock, since the "current" values are only stable there.
fn resolve_refresh_bounds(mut overrides: LiveSettings, current: &IndexState) -> LiveSettings {
    if overrides.max_refresh_sec.is_some() || overrides.min_refresh_sec.is_some() {
        overrides.max_refresh_sec = overrides
            .max_refresh_sec
            .or(Some(current.max_refresh_sec()));
        overrides.min_refresh_sec = overrides
            .min_refresh_sec
            .or(Some(current.min_refresh_sec()));
    }
    overrides
}

/// Render the installed snapshot's explicit settings as canonical JSON:
/// fixed field order, unset fields omitted.
fn render_settings(settings: &LiveSettings) -> Result<String, Status> {
    serde_json::to_string_pretty(settings).map_err(|e| {
        Status::internal(format!(
            "Settings were installed but the response could not be rendered: {}",
            e
        ))
    })
}

/// Live settings service implementation
pub struct SettingsServiceImpl {
    pub registry: Arc<IndexRegistry>,
}

impl SettingsServiceImpl {
    pub fn new(registry: Arc<IndexRegistry>) -> Self {
        Self { registry }
    }

    /// Apply a partial live settings update and return the installed
    /// settings.
    ///
    /// An all-sentinel request installs nothing new and serves as a read of
    /// the current settings.
    pub async fn live_settings(
        &self,
        request: Request<LiveSettingsRequest>,
    ) -> Result<Response<LiveSettingsResponse>, Status> {
        let req = request.into_inner();
        debug!("Updating live settings: {}", req.index_name);

        let manager = self
            .registry
            .state_manager(&req.index_name)
            .map_err(core_error_to_status)?;

        let overrides = requested_overrides(&req);

        // Hold the index's write lock across read-resolve-install so no
        // concurrent update can slip in between the snapshot read and the
        // swap; a lock around the install alone would still lose updates.
        let installed = {
            let guard = manager.write();
            let resolved = resolve_refresh_bounds(overrides, &guard.current());
            guard.install(&resolved, false).map_err(core_error_to_status)?
        };

        let rendered = render_settings(installed.settings())?;

        info!(
            "Installed live settings: {} (generation={})",
            req.index_name,
            installed.generation()
        );

        Ok(Response::new(LiveSettingsResponse { response: rendered }))
    }
}
