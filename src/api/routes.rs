//! API Routes
//!
//! Configures the Axum router with all document gateway endpoints.

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, get_doc_handler, health_handler, list_collection_handler,
    set_doc_handler, stats_handler, update_doc_handler, AppState,
};
use super::middleware::client_rate_limit;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /docs/:collection` - List a collection
/// - `GET /docs/:collection/:id` - Read a document
/// - `PUT /docs/:collection/:id` - Create or replace a document
/// - `PATCH /docs/:collection/:id` - Merge fields into a document
/// - `DELETE /cache` - Drop every cached value
/// - `GET /stats` - Cache and limiter statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Client rate limit on every route except `/health`
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/docs/:collection", get(list_collection_handler))
        .route(
            "/docs/:collection/:id",
            get(get_doc_handler)
                .put(set_doc_handler)
                .patch(update_doc_handler),
        )
        .route("/cache", delete(clear_cache_handler))
        .route("/stats", get(stats_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            client_rate_limit,
        ))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
