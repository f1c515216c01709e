//! Credential storage error types.
//!
//! These only surface at the [`crate::storage::SecureStorage`] boundary; the
//! credential store itself swallows them and exposes empty state instead.

use thiserror::Error;

/// Errors from the secure key-value storage backend.
#[derive(Debug, Error)]
pub enum AuthError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, AuthError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
