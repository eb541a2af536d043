//! Path segment validation.
//!
//! Collection names and document ids follow the document database's naming
//! rules, checked before anything reaches the cache or the store.

use crate::error::{GatewayError, Result};

/// Maximum size of a collection name or document id in bytes
pub const MAX_SEGMENT_BYTES: usize = 1500;

/// Validates a collection name.
pub fn validate_collection(name: &str) -> Result<()> {
    validate_segment("Collection name", name)
}

/// Validates a document id.
pub fn validate_doc_id(id: &str) -> Result<()> {
    validate_segment("Document id", id)
}

fn validate_segment(what: &str, segment: &str) -> Result<()> {
    let problem = if segment.is_empty() {
        Some("cannot be empty")
    } else if segment.len() > MAX_SEGMENT_BYTES {
        Some("exceeds 1500 bytes")
    } else if segment.contains('/') {
        Some("cannot contain '/'")
    } else if segment == "." || segment == ".." {
        Some("cannot be '.' or '..'")
    } else if segment.starts_with("__") && segment.ends_with("__") {
        Some("cannot match the reserved __.*__ form")
    } else {
        None
    };

    match problem {
        Some(problem) => Err(GatewayError::InvalidRequest(format!("{} {}", what, problem))),
        None => Ok(()),
    }
}
