//! Per-client request limiting.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::handlers::AppState;
use crate::error::{GatewayError, Result};

/// Key used when a request carries no client address
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Identifies the caller by the first `x-forwarded-for` address.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Rejects the request with 429 once its client is over quota.
pub async fn client_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let client = client_key(request.headers());
    if !state.client_limiter.write().await.is_allowed(&client) {
        warn!(client = %client, path = %request.uri().path(), "Client rate limit exceeded");
        return Err(GatewayError::RateLimited(format!("client {}", client)));
    }

    Ok(next.run(request).await)
}
