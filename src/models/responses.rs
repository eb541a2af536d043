//! Response DTOs for the storefront cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::gateway::GatewayStats;
use crate::store::Document;

/// Response body for single-document reads and writes
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub success: bool,
    pub collection: String,
    pub document: Document,
}

impl DocumentResponse {
    pub fn new(collection: impl Into<String>, document: Document) -> Self {
        Self {
            success: true,
            collection: collection.into(),
            document,
        }
    }
}

/// Response body for GET /docs/:collection
#[derive(Debug, Clone, Serialize)]
pub struct CollectionResponse {
    pub success: bool,
    pub collection: String,
    pub count: usize,
    pub documents: Vec<Document>,
}

impl CollectionResponse {
    pub fn new(collection: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            success: true,
            collection: collection.into(),
            count: documents.len(),
            documents,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            success: true,
            message: "Cache cleared".to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Reads answered from live cache entries
    pub hits: u64,
    /// Reads that had to go to the store or fall back
    pub misses: u64,
    /// Entries dropped after their TTL elapsed
    pub expirations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Keys tracked by the store rate limiter
    pub store_limiter_keys: usize,
    /// Clients tracked by the request rate limiter
    pub client_limiter_keys: usize,
}

impl StatsResponse {
    pub fn new(stats: &GatewayStats, client_limiter_keys: usize) -> Self {
        let cache = &stats.cache;
        Self {
            hits: cache.hits,
            misses: cache.misses,
            expirations: cache.expirations,
            total_entries: cache.total_entries,
            hit_rate: cache.hit_rate(),
            store_limiter_keys: stats.limiter_keys,
            client_limiter_keys,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
