//! Cache and rate limiter key builders.

/// Cache key for a single document.
pub fn doc_key(collection: &str, id: &str) -> String {
    format!("doc:{}/{}", collection, id)
}

/// Cache key for a whole collection listing.
pub fn collection_key(collection: &str) -> String {
    format!("collection:{}", collection)
}

pub fn read_limit_key(collection: &str) -> String {
    format!("read:{}", collection)
}

pub fn write_limit_key(collection: &str) -> String {
    format!("write:{}", collection)
}
