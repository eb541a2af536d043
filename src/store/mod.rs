//! Document Store Module
//!
//! The database the storefront reads and writes through. Documents live in
//! named collections and carry a JSON object body. Errors carry a
//! Firestore-style status code which the retry layer uses to decide whether
//! a call is worth repeating.

mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryStore;

/// JSON object body of a document
pub type Fields = Map<String, Value>;

// == Document ==
/// A document and its id within a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Fields) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

// == Error Code ==
/// Status codes reported by the document database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PermissionDenied,
    Unauthenticated,
    InvalidArgument,
    NotFound,
    ResourceExhausted,
    Unavailable,
    DeadlineExceeded,
    Aborted,
    Internal,
    Unknown,
}

impl ErrorCode {
    /// Parses a wire code such as `"permission-denied"`.
    ///
    /// Unrecognised codes map to [`ErrorCode::Unknown`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "permission-denied" => Self::PermissionDenied,
            "unauthenticated" => Self::Unauthenticated,
            "invalid-argument" => Self::InvalidArgument,
            "not-found" => Self::NotFound,
            "resource-exhausted" => Self::ResourceExhausted,
            "unavailable" => Self::Unavailable,
            "deadline-exceeded" => Self::DeadlineExceeded,
            "aborted" => Self::Aborted,
            "internal" => Self::Internal,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidArgument => "invalid-argument",
            Self::NotFound => "not-found",
            Self::ResourceExhausted => "resource-exhausted",
            Self::Unavailable => "unavailable",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::Aborted => "aborted",
            Self::Internal => "internal",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Store Error ==
/// Error returned by a [`DocumentStore`] call.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: ErrorCode,
    pub message: String,
}

impl StoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result of a single store call
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Document Store Trait ==
/// Collection/document CRUD against the backing database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches one document, `None` if it does not exist.
    async fn get_doc(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Fetches every document in a collection, ordered by id.
    async fn list_docs(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Creates or replaces a document.
    async fn set_doc(&self, collection: &str, id: &str, data: Fields) -> StoreResult<Document>;

    /// Merges top-level fields into an existing document.
    ///
    /// Fails with [`ErrorCode::NotFound`] if the document does not exist.
    async fn update_doc(&self, collection: &str, id: &str, patch: Fields)
        -> StoreResult<Document>;
}
