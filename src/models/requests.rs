//! Request DTOs for the storefront cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::store::Fields;

/// Request body for document writes (PUT and PATCH /docs/:collection/:id)
///
/// # Fields
/// - `data`: Document body for PUT, fields to merge for PATCH
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    /// Document fields
    pub data: Fields,
}

impl WriteRequest {
    /// Validates a PATCH body.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate_patch(&self) -> Option<String> {
        if self.data.is_empty() {
            return Some("Update must change at least one field".to_string());
        }
        None
    }
}
