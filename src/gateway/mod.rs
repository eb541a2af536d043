//! Document Gateway Module
//!
//! Cache-aware access to the document store. Reads are answered from the
//! TTL cache when fresh; otherwise they pass the read rate limiter and go to
//! the store through the retry wrapper. When the limiter refuses a read or
//! the store fails, a stale cached copy is returned if one exists. Writes
//! pass the write limiter, are retried, and refresh the cache on success.

mod keys;
mod validate;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, Lookup, TtlCache};
use crate::clock::{system_clock, Clock};
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::limiter::RateLimiter;
use crate::retry::{with_retry, RetryPolicy};
use crate::store::{Document, DocumentStore, Fields};

pub use keys::{collection_key, doc_key, read_limit_key, write_limit_key};
pub use validate::{validate_collection, validate_doc_id};

// == Cached Value ==
/// What the gateway keeps in its cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Document(Document),
    Collection(Vec<Document>),
}

// == Cleanup Report ==
/// Outcome of one [`DocumentGateway::cleanup`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Expired cache entries removed
    pub expired_entries: usize,
    /// Rate limiter keys dropped for having no recent requests
    pub idle_limiter_keys: usize,
}

// == Gateway Stats ==
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStats {
    pub cache: CacheStats,
    pub limiter_keys: usize,
}

// == Document Gateway ==
/// Cache, rate limiter and retry policy in front of a [`DocumentStore`].
pub struct DocumentGateway {
    store: Arc<dyn DocumentStore>,
    cache: RwLock<TtlCache<CachedValue>>,
    limiter: RwLock<RateLimiter>,
    retry: RetryPolicy,
    /// Bumped under the cache lock by every successful write
    write_generation: AtomicU64,
}

impl DocumentGateway {
    // == Constructor ==
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: TtlCache<CachedValue>,
        limiter: RateLimiter,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            cache: RwLock::new(cache),
            limiter: RwLock::new(limiter),
            retry,
            write_generation: AtomicU64::new(0),
        }
    }

    /// Builds a gateway from configuration on the system clock.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self::from_config_with_clock(store, config, system_clock())
    }

    /// Builds a gateway from configuration reading time from `clock`.
    pub fn from_config_with_clock(
        store: Arc<dyn DocumentStore>,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = TtlCache::with_clock(config.default_ttl(), clock.clone());
        let limiter = RateLimiter::with_clock(
            config.store_rate_limit,
            config.store_rate_window(),
            clock,
        );
        Self::new(store, cache, limiter, config.retry_policy())
    }

    // == Get Cached Doc ==
    /// Reads one document, `None` if it does not exist.
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of the cached copy (cache default if None)
    pub async fn get_cached_doc(
        &self,
        collection: &str,
        id: &str,
        ttl: Option<Duration>,
    ) -> Result<Option<Document>> {
        validate_collection(collection)?;
        validate_doc_id(id)?;
        let key = doc_key(collection, id);

        let stale = match self.cache.write().await.lookup(&key) {
            Lookup::Fresh(CachedValue::Document(doc)) => {
                debug!(key = %key, "Cache hit");
                return Ok(Some(doc));
            }
            Lookup::Stale(CachedValue::Document(doc)) => Some(doc),
            _ => None,
        };

        let limit_key = read_limit_key(collection);
        if !self.limiter.write().await.is_allowed(&limit_key) {
            warn!(key = %key, "Read rate limit exceeded");
            return match stale {
                Some(doc) => {
                    warn!(key = %key, "Serving stale document");
                    Ok(Some(doc))
                }
                None => Err(GatewayError::RateLimited(limit_key)),
            };
        }

        let generation = self.write_generation.load(Ordering::SeqCst);
        let store = &self.store;
        let fetched = with_retry(&self.retry, "get_doc", || store.get_doc(collection, id)).await;

        match fetched {
            Ok(Some(doc)) => {
                let value = CachedValue::Document(doc.clone());
                self.cache_read(key, Some(value), ttl, generation).await;
                Ok(Some(doc))
            }
            Ok(None) => {
                self.cache_read(key, None, ttl, generation).await;
                Ok(None)
            }
            Err(err) => match stale {
                Some(doc) => {
                    warn!(key = %key, error = %err, "Store read failed, serving stale document");
                    Ok(Some(doc))
                }
                None => Err(err),
            },
        }
    }

    // == Get Cached Collection ==
    /// Reads every document in a collection.
    pub async fn get_cached_collection(
        &self,
        collection: &str,
        ttl: Option<Duration>,
    ) -> Result<Vec<Document>> {
        validate_collection(collection)?;
        let key = collection_key(collection);

        let stale = match self.cache.write().await.lookup(&key) {
            Lookup::Fresh(CachedValue::Collection(docs)) => {
                debug!(key = %key, "Cache hit");
                return Ok(docs);
            }
            Lookup::Stale(CachedValue::Collection(docs)) => Some(docs),
            _ => None,
        };

        let limit_key = read_limit_key(collection);
        if !self.limiter.write().await.is_allowed(&limit_key) {
            warn!(key = %key, "Read rate limit exceeded");
            return match stale {
                Some(docs) => {
                    warn!(key = %key, "Serving stale collection");
                    Ok(docs)
                }
                None => Err(GatewayError::RateLimited(limit_key)),
            };
        }

        let generation = self.write_generation.load(Ordering::SeqCst);
        let store = &self.store;
        let fetched = with_retry(&self.retry, "list_docs", || store.list_docs(collection)).await;

        match fetched {
            Ok(docs) => {
                let value = CachedValue::Collection(docs.clone());
                self.cache_read(key, Some(value), ttl, generation).await;
                Ok(docs)
            }
            Err(err) => match stale {
                Some(docs) => {
                    warn!(key = %key, error = %err, "Store read failed, serving stale collection");
                    Ok(docs)
                }
                None => Err(err),
            },
        }
    }

    // == Safe Set Doc ==
    /// Creates or replaces a document and caches the result.
    pub async fn safe_set_doc(&self, collection: &str, id: &str, data: Fields) -> Result<Document> {
        validate_collection(collection)?;
        validate_doc_id(id)?;
        self.check_write_limit(collection).await?;

        let store = &self.store;
        let doc = with_retry(&self.retry, "set_doc", || {
            store.set_doc(collection, id, data.clone())
        })
        .await?;

        self.remember_write(collection, &doc).await;
        info!(collection, id, "Document written");
        Ok(doc)
    }

    // == Safe Update Doc ==
    /// Merges `patch` into an existing document and caches the result.
    pub async fn safe_update_doc(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
    ) -> Result<Document> {
        validate_collection(collection)?;
        validate_doc_id(id)?;
        self.check_write_limit(collection).await?;

        let store = &self.store;
        let doc = with_retry(&self.retry, "update_doc", || {
            store.update_doc(collection, id, patch.clone())
        })
        .await?;

        self.remember_write(collection, &doc).await;
        info!(collection, id, "Document updated");
        Ok(doc)
    }

    // == Maintenance ==
    /// Sweeps expired cache entries and idle limiter keys.
    pub async fn cleanup(&self) -> CleanupReport {
        CleanupReport {
            expired_entries: self.cache.write().await.cleanup(),
            idle_limiter_keys: self.limiter.write().await.cleanup(),
        }
    }

    /// Drops every cached value.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        info!("Document cache cleared");
    }

    pub async fn stats(&self) -> GatewayStats {
        GatewayStats {
            cache: self.cache.read().await.stats(),
            limiter_keys: self.limiter.read().await.tracked_keys(),
        }
    }

    async fn check_write_limit(&self, collection: &str) -> Result<()> {
        let limit_key = write_limit_key(collection);
        if self.limiter.write().await.is_allowed(&limit_key) {
            Ok(())
        } else {
            warn!(collection, "Write rate limit exceeded");
            Err(GatewayError::RateLimited(limit_key))
        }
    }

    /// Stores a read result, or drops the key when the store had nothing.
    ///
    /// Skipped when a write finished after `generation` was taken.
    async fn cache_read(
        &self,
        key: String,
        value: Option<CachedValue>,
        ttl: Option<Duration>,
        generation: u64,
    ) {
        let mut cache = self.cache.write().await;
        if self.write_generation.load(Ordering::SeqCst) != generation {
            debug!(key = %key, "Write landed during read, not caching result");
            return;
        }
        match value {
            Some(value) => cache.set(key, value, ttl),
            None => {
                cache.delete(&key);
            }
        }
    }

    /// Caches a written document and invalidates its collection listing.
    async fn remember_write(&self, collection: &str, doc: &Document) {
        let mut cache = self.cache.write().await;
        self.write_generation.fetch_add(1, Ordering::SeqCst);
        cache.set(
            doc_key(collection, &doc.id),
            CachedValue::Document(doc.clone()),
            None,
        );
        cache.delete(&collection_key(collection));
    }
}

#[cfg(test)]
mod tests;
