//! Cache store error types.

/// Errors from a cache store. Always non-fatal to routing.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Filesystem operation failed
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized
    #[error("cache serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backing storage is not reachable
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}
