//! Error types for the event cache.
//!
//! Runtime operations never fail; only constructing a cache can.

use thiserror::Error;

/// Main error type for cache construction.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Idle reaper thread could not be started: {0}")]
    ReaperUnavailable(#[from] std::io::Error),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
