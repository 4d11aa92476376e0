//! End-to-end tests for the live settings update protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tonic::{Code, Request};

use iris_core::{JsonSettingsStore, LiveSettings, SettingsStore};
use iris_server::proto::LiveSettingsRequest;
use iris_server::{IndexRegistry, SettingsServiceImpl};

fn test_registry() -> (tempfile::TempDir, Arc<IndexRegistry>) {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(IndexRegistry::new(dir.path().to_path_buf()));
    (dir, registry)
}

fn response_json(response: &iris_server::proto::LiveSettingsResponse) -> serde_json::Value {
    serde_json::from_str(&response.response).unwrap()
}

#[tokio::test]
async fn test_end_to_end_partial_update() {
    let (_dir, registry) = test_registry();
    registry.create_index("books").unwrap();
    let service = SettingsServiceImpl::new(Arc::clone(&registry));

    // Seed the current snapshot: max=10, min=1, virtualShards=2
    let seed = LiveSettingsRequest {
        max_refresh_sec: 10.0,
        min_refresh_sec: 1.0,
        virtual_shards: 2,
        ..LiveSettingsRequest::no_change("books")
    };
    service.live_settings(Request::new(seed)).await.unwrap();

    // Partial update: new max, everything else at its sentinel plus one
    // fresh field
    let update = LiveSettingsRequest {
        max_refresh_sec: 5.0,
        slice_max_docs: 1000,
        ..LiveSettingsRequest::no_change("books")
    };
    let response = service
        .live_settings(Request::new(update))
        .await
        .unwrap()
        .into_inner();

    let body = response_json(&response);
    assert_eq!(body["maxRefreshSec"], 5.0);
    // min was resolved from the current snapshot, not dropped
    assert_eq!(body["minRefreshSec"], 1.0);
    assert_eq!(body["virtualShards"], 2);
    assert_eq!(body["sliceMaxDocs"], 1000);
    // Exactly the installed fields are rendered, nothing else
    assert_eq!(body.as_object().unwrap().len(), 4);

    let state = registry.state_manager("books").unwrap().current();
    assert_eq!(state.max_refresh_sec(), 5.0);
    assert_eq!(state.min_refresh_sec(), 1.0);
    assert_eq!(state.virtual_shards(), 2);
    assert_eq!(state.slice_max_docs(), 1000);
}

#[tokio::test]
async fn test_all_sentinel_request_reads_back_current() {
    let (_dir, registry) = test_registry();
    registry.create_index("books").unwrap();
    let service = SettingsServiceImpl::new(Arc::clone(&registry));

    let seed = LiveSettingsRequest {
        segments_per_tier: 12,
        ..LiveSettingsRequest::no_change("books")
    };
    service.live_settings(Request::new(seed)).await.unwrap();
    let before = registry.state_manager("books").unwrap().current();

    let response = service
        .live_settings(Request::new(LiveSettingsRequest::no_change("books")))
        .await
        .unwrap()
        .into_inner();

    let body = response_json(&response);
    assert_eq!(body["segmentsPerTier"], 12);
    assert_eq!(body.as_object().unwrap().len(), 1);

    // Nothing changed besides the generation of the reinstall
    let after = registry.state_manager("books").unwrap().current();
    assert_eq!(after.settings(), before.settings());
}

#[tokio::test]
async fn test_explicit_zero_is_installed() {
    let (_dir, registry) = test_registry();
    registry.create_index("books").unwrap();
    let service = SettingsServiceImpl::new(Arc::clone(&registry));

    let update = LiveSettingsRequest {
        default_search_timeout_sec: 0.0,
        default_terminate_after: 0,
        ..LiveSettingsRequest::no_change("books")
    };
    let response = service
        .live_settings(Request::new(update))
        .await
        .unwrap()
        .into_inner();

    let body = response_json(&response);
    assert_eq!(body["defaultSearchTimeoutSec"], 0.0);
    assert_eq!(body["defaultTerminateAfter"], 0);
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_idempotent_reapply() {
    let (_dir, registry) = test_registry();
    registry.create_index("books").unwrap();
    let service = SettingsServiceImpl::new(Arc::clone(&registry));

    let update = LiveSettingsRequest {
        max_refresh_sec: 5.0,
        slice_max_docs: 1000,
        ..LiveSettingsRequest::no_change("books")
    };

    let first = service
        .live_settings(Request::new(update.clone()))
        .await
        .unwrap()
        .into_inner();
    let second = service
        .live_settings(Request::new(update))
        .await
        .unwrap()
        .into_inner();

    // Same request against the result of the first application resolves to
    // the same settings
    assert_eq!(first.response, second.response);
}

#[tokio::test]
async fn test_unknown_index_is_not_found() {
    let (_dir, registry) = test_registry();
    let service = SettingsServiceImpl::new(registry);

    let err = service
        .live_settings(Request::new(LiveSettingsRequest::no_change("missing")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

/// Store that widens the install window, forcing concurrent updates to
/// actually overlap in time.
struct SlowStore {
    inner: JsonSettingsStore,
}

impl SettingsStore for SlowStore {
    fn save(&self, index: &str, settings: &LiveSettings) -> iris_core::Result<()> {
        std::thread::sleep(Duration::from_millis(50));
        self.inner.save(index, settings)
    }

    fn load(&self, index: &str) -> iris_core::Result<Option<LiveSettings>> {
        self.inner.load(index)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SlowStore {
        inner: JsonSettingsStore::new(dir.path()),
    });
    let registry = Arc::new(IndexRegistry::with_store(dir.path().to_path_buf(), store));
    registry.create_index("books").unwrap();
    let service = Arc::new(SettingsServiceImpl::new(Arc::clone(&registry)));

    let docs_task = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            let update = LiveSettingsRequest {
                slice_max_docs: 1000,
                ..LiveSettingsRequest::no_change("books")
            };
            service.live_settings(Request::new(update)).await
        })
    };
    let shards_task = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            let update = LiveSettingsRequest {
                virtual_shards: 4,
                ..LiveSettingsRequest::no_change("books")
            };
            service.live_settings(Request::new(update)).await
        })
    };

    docs_task.await.unwrap().unwrap();
    shards_task.await.unwrap().unwrap();

    // Whichever update won the lock first, neither change was lost
    let state = registry.state_manager("books").unwrap().current();
    assert_eq!(state.settings().slice_max_docs, Some(1000));
    assert_eq!(state.settings().virtual_shards, Some(4));
    assert_eq!(state.generation(), 2);
}

#[tokio::test]
async fn test_indices_update_independently() {
    let (_dir, registry) = test_registry();
    registry.create_index("a").unwrap();
    registry.create_index("b").unwrap();
    let service = SettingsServiceImpl::new(Arc::clone(&registry));

    // Hold b's write lock for the duration of a's update
    let b_manager = registry.state_manager("b").unwrap();
    let b_guard = b_manager.write();

    let update = LiveSettingsRequest {
        virtual_shards: 4,
        ..LiveSettingsRequest::no_change("a")
    };
    tokio::time::timeout(
        Duration::from_secs(5),
        service.live_settings(Request::new(update)),
    )
    .await
    .expect("update to index a blocked on index b's lock")
    .unwrap();

    drop(b_guard);

    // b is still updatable once its lock is free
    let update = LiveSettingsRequest {
        virtual_shards: 2,
        ..LiveSettingsRequest::no_change("b")
    };
    service.live_settings(Request::new(update)).await.unwrap();
    assert_eq!(b_manager.current().virtual_shards(), 2);
}

/// Store whose next save fails once, for exercising the install failure
/// path through the full handler.
struct FlakyStore {
    inner: JsonSettingsStore,
    fail_next: AtomicBool,
}

impl SettingsStore for FlakyStore {
    fn save(&self, index: &str, settings: &LiveSettings) -> iris_core::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(iris_core::Error::Io(std::io::Error::other("disk full")));
        }
        self.inner.save(index, settings)
    }

    fn load(&self, index: &str) -> iris_core::Result<Option<LiveSettings>> {
        self.inner.load(index)
    }
}

#[tokio::test]
async fn test_failed_install_surfaces_and_retry_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FlakyStore {
        inner: JsonSettingsStore::new(dir.path()),
        fail_next: AtomicBool::new(true),
    });
    let registry = Arc::new(IndexRegistry::with_store(dir.path().to_path_buf(), store));
    registry.create_index("books").unwrap();
    let service = SettingsServiceImpl::new(Arc::clone(&registry));

    let update = LiveSettingsRequest {
        virtual_shards: 4,
        ..LiveSettingsRequest::no_change("books")
    };

    let err = service
        .live_settings(Request::new(update.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unavailable);

    // Nothing was installed; the prior snapshot is still authoritative
    let state = registry.state_manager("books").unwrap().current();
    assert_eq!(state.generation(), 0);
    assert!(state.settings().is_empty());

    // The lock was released, so the retry goes through unchanged
    let response = service
        .live_settings(Request::new(update))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response_json(&response)["virtualShards"], 4);
    assert_eq!(
        registry
            .state_manager("books")
            .unwrap()
            .current()
            .virtual_shards(),
        4
    );
}
