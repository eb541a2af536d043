use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

use super::*;
use crate::clock::ManualClock;
use crate::store::{ErrorCode, MemoryStore, StoreResult};

const TTL: Duration = Duration::from_millis(100);

struct Harness {
    gateway: DocumentGateway,
    store: Arc<MemoryStore>,
    clock: ManualClock,
}

fn harness(store_rate_limit: usize) -> Harness {
    let clock = ManualClock::new(1_000_000);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let store = Arc::new(MemoryStore::new());
    let gateway = DocumentGateway::new(
        store.clone(),
        TtlCache::with_clock(TTL, shared.clone()),
        RateLimiter::with_clock(store_rate_limit, Duration::from_secs(1), shared),
        RetryPolicy::new(3, Duration::from_millis(10)).without_jitter(),
    );
    Harness {
        gateway,
        store,
        clock,
    }
}

fn fields(value: serde_json::Value) -> Fields {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

async fn seed(h: &Harness, collection: &str, id: &str, value: serde_json::Value) {
    h.store.set_doc(collection, id, fields(value)).await.unwrap();
}

#[tokio::test]
async fn test_get_cached_doc_serves_second_read_from_cache() {
    let h = harness(100);
    seed(&h, "products", "apple", json!({"price": 3})).await;

    let first = h.gateway.get_cached_doc("products", "apple", None).await.unwrap();
    let second = h.gateway.get_cached_doc("products", "apple", None).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.unwrap().data["price"], 3);
    assert_eq!(h.store.calls(), 2, "seed plus one fetch");
    assert_eq!(h.gateway.stats().await.cache.hits, 1);
}

#[tokio::test]
async fn test_missing_doc_is_not_cached() {
    let h = harness(100);

    assert_eq!(h.gateway.get_cached_doc("products", "ghost", None).await.unwrap(), None);
    assert_eq!(h.gateway.get_cached_doc("products", "ghost", None).await.unwrap(), None);
    assert_eq!(h.store.calls(), 2);
}

#[tokio::test]
async fn test_expired_doc_is_refetched() {
    let h = harness(100);
    seed(&h, "products", "apple", json!({"price": 3})).await;

    h.gateway.get_cached_doc("products", "apple", None).await.unwrap();
    seed(&h, "products", "apple", json!({"price": 4})).await;
    h.clock.advance(Duration::from_millis(150));

    let doc = h.gateway.get_cached_doc("products", "apple", None).await.unwrap();
    assert_eq!(doc.unwrap().data["price"], 4);
}

#[tokio::test]
async fn test_custom_ttl_outlives_default() {
    let h = harness(100);
    seed(&h, "products", "apple", json!({"price": 3})).await;

    h.gateway
        .get_cached_doc("products", "apple", Some(Duration::from_secs(10)))
        .await
        .unwrap();
    h.clock.advance(Duration::from_millis(500));
    h.gateway.get_cached_doc("products", "apple", None).await.unwrap();

    assert_eq!(h.store.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_store_failure_serves_stale_doc() {
    let h = harness(100);
    seed(&h, "products", "apple", json!({"price": 3})).await;
    h.gateway.get_cached_doc("products", "apple", None).await.unwrap();

    h.clock.advance(Duration::from_millis(150));
    h.store.inject_failures(ErrorCode::Unavailable, 3).await;

    let doc = assert_ok!(h.gateway.get_cached_doc("products", "apple", None).await);
    assert_eq!(doc.unwrap().data["price"], 3);
    assert_eq!(h.store.calls(), 5, "seed, first fetch, three failed attempts");
}

#[tokio::test(start_paused = true)]
async fn test_store_failure_without_stale_data_is_an_error() {
    let h = harness(100);
    h.store.inject_failures(ErrorCode::Unavailable, 3).await;

    let err = assert_err!(h.gateway.get_cached_doc("products", "apple", None).await);
    assert!(matches!(err, GatewayError::RetriesExhausted { attempts: 3, .. }));
}

#[tokio::test]
async fn test_fatal_error_falls_back_to_stale_doc() {
    let h = harness(100);
    seed(&h, "orders", "o1", json!({"status": "new"})).await;
    h.gateway.get_cached_doc("orders", "o1", None).await.unwrap();

    h.clock.advance(Duration::from_millis(150));
    h.store.inject_failure(ErrorCode::PermissionDenied).await;

    let doc = h.gateway.get_cached_doc("orders", "o1", None).await.unwrap();
    assert_eq!(doc.unwrap().data["status"], "new");
}

#[tokio::test]
async fn test_fatal_error_makes_a_single_attempt() {
    let h = harness(100);
    h.store.inject_failure(ErrorCode::PermissionDenied).await;

    let err = h.gateway.get_cached_doc("orders", "o1", None).await.unwrap_err();
    assert_eq!(err.store_code(), Some(ErrorCode::PermissionDenied));
    assert_eq!(h.store.calls(), 1);
}

#[tokio::test]
async fn test_read_rate_limit_without_stale_data() {
    let h = harness(1);
    seed(&h, "products", "apple", json!({})).await;
    seed(&h, "products", "pear", json!({})).await;

    assert_ok!(h.gateway.get_cached_doc("products", "apple", None).await);
    let err = h.gateway.get_cached_doc("products", "pear", None).await.unwrap_err();

    assert!(matches!(err, GatewayError::RateLimited(ref key) if key == "read:products"));
}

#[tokio::test]
async fn test_read_rate_limit_serves_stale_doc() {
    let h = harness(1);
    seed(&h, "products", "apple", json!({"price": 3})).await;
    h.gateway.get_cached_doc("products", "apple", None).await.unwrap();

    h.clock.advance(Duration::from_millis(150));
    let calls_before = h.store.calls();
    let doc = h.gateway.get_cached_doc("products", "apple", None).await.unwrap();

    assert_eq!(doc.unwrap().data["price"], 3);
    assert_eq!(h.store.calls(), calls_before, "limited read must not reach the store");
}

#[tokio::test]
async fn test_rate_limit_is_per_collection() {
    let h = harness(1);

    assert_ok!(h.gateway.get_cached_collection("products", None).await);
    assert_ok!(h.gateway.get_cached_collection("orders", None).await);
}

#[tokio::test]
async fn test_read_rate_limit_serves_stale_listing() {
    let h = harness(1);
    seed(&h, "products", "a", json!({"n": 1})).await;
    let first = h.gateway.get_cached_collection("products", None).await.unwrap();

    h.clock.advance(Duration::from_millis(150));
    let calls_before = h.store.calls();
    let docs = h.gateway.get_cached_collection("products", None).await.unwrap();

    assert_eq!(docs, first);
    assert_eq!(h.store.calls(), calls_before, "limited read must not reach the store");
}

#[tokio::test]
async fn test_read_rate_limit_without_stale_listing() {
    let h = harness(1);
    assert_ok!(h.gateway.get_cached_collection("products", None).await);
    h.gateway.clear_cache().await;

    let err = h.gateway.get_cached_collection("products", None).await.unwrap_err();

    assert!(matches!(err, GatewayError::RateLimited(ref key) if key == "read:products"));
    assert_eq!(h.store.calls(), 1);
}

#[tokio::test]
async fn test_get_cached_collection() {
    let h = harness(100);
    seed(&h, "products", "b", json!({"n": 2})).await;
    seed(&h, "products", "a", json!({"n": 1})).await;

    let docs = h.gateway.get_cached_collection("products", None).await.unwrap();
    let again = h.gateway.get_cached_collection("products", None).await.unwrap();

    assert_eq!(docs.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(docs, again);
    assert_eq!(h.store.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_collection_failure_serves_stale_listing() {
    let h = harness(100);
    seed(&h, "products", "a", json!({})).await;
    h.gateway.get_cached_collection("products", None).await.unwrap();

    h.clock.advance(Duration::from_millis(150));
    h.store.inject_failures(ErrorCode::DeadlineExceeded, 3).await;

    let docs = h.gateway.get_cached_collection("products", None).await.unwrap();
    assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn test_safe_set_doc_caches_written_document() {
    let h = harness(100);

    let written = h
        .gateway
        .safe_set_doc("carts", "c1", fields(json!({"items": 2})))
        .await
        .unwrap();
    let read = h.gateway.get_cached_doc("carts", "c1", None).await.unwrap();

    assert_eq!(read, Some(written));
    assert_eq!(h.store.calls(), 1, "read should be served from cache");
}

#[tokio::test]
async fn test_write_invalidates_collection_listing() {
    let h = harness(100);
    seed(&h, "products", "a", json!({})).await;
    assert_eq!(h.gateway.get_cached_collection("products", None).await.unwrap().len(), 1);

    h.gateway
        .safe_set_doc("products", "b", fields(json!({})))
        .await
        .unwrap();

    assert_eq!(h.gateway.get_cached_collection("products", None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_safe_update_doc_merges_and_caches() {
    let h = harness(100);
    seed(&h, "orders", "o1", json!({"status": "new", "total": 12})).await;
    h.gateway.get_cached_doc("orders", "o1", None).await.unwrap();

    let updated = h
        .gateway
        .safe_update_doc("orders", "o1", fields(json!({"status": "shipped"})))
        .await
        .unwrap();
    assert_eq!(updated.data["total"], 12);

    let read = h.gateway.get_cached_doc("orders", "o1", None).await.unwrap().unwrap();
    assert_eq!(read.data["status"], "shipped");
    assert_eq!(h.store.calls(), 3, "seed, first read, update");
}

#[tokio::test]
async fn test_safe_update_missing_doc_is_fatal_not_found() {
    let h = harness(100);

    let err = h
        .gateway
        .safe_update_doc("orders", "nope", fields(json!({"status": "x"})))
        .await
        .unwrap_err();

    assert_eq!(err.store_code(), Some(ErrorCode::NotFound));
    assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    assert_eq!(h.store.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_safe_set_doc_retries_transient_failure() {
    let h = harness(100);
    h.store.inject_failure(ErrorCode::Aborted).await;

    assert_ok!(h.gateway.safe_set_doc("carts", "c1", Fields::new()).await);
    assert_eq!(h.store.calls(), 2);
}

#[tokio::test]
async fn test_write_rate_limit() {
    let h = harness(1);

    assert_ok!(h.gateway.safe_set_doc("carts", "c1", Fields::new()).await);
    let err = h
        .gateway
        .safe_set_doc("carts", "c2", Fields::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::RateLimited(_)));
}

#[tokio::test]
async fn test_invalid_path_never_reaches_store() {
    let h = harness(100);

    let err = h.gateway.get_cached_doc("products", "a/b", None).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest(_)));
    assert!(h.gateway.get_cached_collection("", None).await.is_err());
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn test_cleanup_and_clear() {
    let h = harness(100);
    seed(&h, "products", "a", json!({})).await;
    h.gateway.get_cached_doc("products", "a", None).await.unwrap();
    h.gateway.get_cached_collection("products", Some(Duration::from_secs(60))).await.unwrap();

    h.clock.advance(Duration::from_millis(1_500));
    let report = h.gateway.cleanup().await;

    assert_eq!(report.expired_entries, 1);
    assert_eq!(report.idle_limiter_keys, 1);
    assert_eq!(h.gateway.stats().await.cache.total_entries, 1);

    h.gateway.clear_cache().await;
    assert_eq!(h.gateway.stats().await.cache.total_entries, 0);
}

/// Store whose reads hold their result until `release` is notified.
#[derive(Default)]
struct GatedStore {
    inner: MemoryStore,
    release: Notify,
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn get_doc(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let result = self.inner.get_doc(collection, id).await;
        self.release.notified().await;
        result
    }

    async fn list_docs(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let result = self.inner.list_docs(collection).await;
        self.release.notified().await;
        result
    }

    async fn set_doc(&self, collection: &str, id: &str, data: Fields) -> StoreResult<Document> {
        self.inner.set_doc(collection, id, data).await
    }

    async fn update_doc(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
    ) -> StoreResult<Document> {
        self.inner.update_doc(collection, id, patch).await
    }
}

fn gated_gateway(store: Arc<GatedStore>) -> DocumentGateway {
    DocumentGateway::new(
        store,
        TtlCache::new(Duration::from_secs(60)),
        RateLimiter::new(100, Duration::from_secs(1)),
        RetryPolicy::new(3, Duration::from_millis(10)).without_jitter(),
    )
}

#[tokio::test]
async fn test_write_during_read_keeps_written_document_cached() {
    let store = Arc::new(GatedStore::default());
    store.inner.set_doc("products", "apple", fields(json!({"price": 3}))).await.unwrap();
    let gateway = gated_gateway(store.clone());

    let (read, written) = tokio::join!(
        gateway.get_cached_doc("products", "apple", None),
        async {
            let written = gateway
                .safe_set_doc("products", "apple", fields(json!({"price": 4})))
                .await;
            store.release.notify_one();
            written
        }
    );
    assert_eq!(read.unwrap().unwrap().data["price"], 3);
    assert_eq!(written.unwrap().data["price"], 4);

    let calls_before = store.inner.calls();
    let cached = gateway.get_cached_doc("products", "apple", None).await.unwrap();
    assert_eq!(cached.unwrap().data["price"], 4);
    assert_eq!(store.inner.calls(), calls_before);
}

#[tokio::test]
async fn test_write_during_listing_leaves_listing_uncached() {
    let store = Arc::new(GatedStore::default());
    store.inner.set_doc("products", "a", fields(json!({}))).await.unwrap();
    let gateway = gated_gateway(store.clone());

    let (listed, written) = tokio::join!(
        gateway.get_cached_collection("products", None),
        async {
            let written = gateway.safe_set_doc("products", "b", fields(json!({}))).await;
            store.release.notify_one();
            written
        }
    );
    assert_eq!(listed.unwrap().len(), 1);
    assert_ok!(written);

    store.release.notify_one();
    let docs = gateway.get_cached_collection("products", None).await.unwrap();
    assert_eq!(docs.len(), 2);
}
