//! API Module
//!
//! HTTP handlers and routing for the document gateway REST API.
//!
//! # Endpoints
//! - `GET /docs/:collection` - List a collection
//! - `GET /docs/:collection/:id` - Read a document
//! - `PUT /docs/:collection/:id` - Create or replace a document
//! - `PATCH /docs/:collection/:id` - Merge fields into a document
//! - `DELETE /cache` - Clear the cache
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
