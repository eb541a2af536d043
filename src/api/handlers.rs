//! API Handlers
//!
//! HTTP request handlers for each document gateway endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::gateway::{CleanupReport, DocumentGateway};
use crate::limiter::RateLimiter;
use crate::models::{
    ClearResponse, CollectionResponse, DocumentResponse, HealthResponse, StatsResponse,
    WriteRequest,
};
use crate::store::MemoryStore;

/// Application state shared across all handlers.
///
/// Owns the document gateway and the per-client request limiter.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<DocumentGateway>,
    /// Requests per client address
    pub client_limiter: Arc<RwLock<RateLimiter>>,
}

impl AppState {
    /// Creates a new AppState from its parts.
    pub fn new(gateway: DocumentGateway, client_limiter: RateLimiter) -> Self {
        Self {
            gateway: Arc::new(gateway),
            client_limiter: Arc::new(RwLock::new(client_limiter)),
        }
    }

    /// Creates a new AppState from configuration, backed by an in-memory store.
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = DocumentGateway::from_config(store, config);
        let client_limiter = RateLimiter::new(config.client_rate_limit, config.client_rate_window());
        Self::new(gateway, client_limiter)
    }

    /// Sweeps the gateway and the client limiter.
    pub async fn cleanup(&self) -> CleanupReport {
        let mut report = self.gateway.cleanup().await;
        report.idle_limiter_keys += self.client_limiter.write().await.cleanup();
        report
    }
}

/// Handler for GET /docs/:collection
pub async fn list_collection_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<CollectionResponse>> {
    let documents = state.gateway.get_cached_collection(&collection, None).await?;
    Ok(Json(CollectionResponse::new(collection, documents)))
}

/// Handler for GET /docs/:collection/:id
pub async fn get_doc_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<DocumentResponse>> {
    let document = state
        .gateway
        .get_cached_doc(&collection, &id, None)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("{}/{}", collection, id)))?;

    Ok(Json(DocumentResponse::new(collection, document)))
}

/// Handler for PUT /docs/:collection/:id
pub async fn set_doc_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    payload: std::result::Result<Json<WriteRequest>, JsonRejection>,
) -> Result<Json<DocumentResponse>> {
    let Json(req) = payload?;
    let document = state.gateway.safe_set_doc(&collection, &id, req.data).await?;
    Ok(Json(DocumentResponse::new(collection, document)))
}

/// Handler for PATCH /docs/:collection/:id
pub async fn update_doc_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    payload: std::result::Result<Json<WriteRequest>, JsonRejection>,
) -> Result<Json<DocumentResponse>> {
    let Json(req) = payload?;
    if let Some(error_msg) = req.validate_patch() {
        return Err(GatewayError::InvalidRequest(error_msg));
    }

    let document = state
        .gateway
        .safe_update_doc(&collection, &id, req.data)
        .await?;
    Ok(Json(DocumentResponse::new(collection, document)))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.gateway.clear_cache().await;
    Json(ClearResponse::cleared())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.gateway.stats().await;
    let client_keys = state.client_limiter.read().await.tracked_keys();
    Json(StatsResponse::new(&stats, client_keys))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
