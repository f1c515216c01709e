//! Realtime error types.

use thiserror::Error;

/// Errors from realtime token issuance and SDK connection.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// A realtime token was requested with no session token present.
    #[error("not authenticated: no session token")]
    NotAuthenticated,

    /// The token endpoint answered with a non-success status.
    #[error("realtime token fetch failed ({status}): {message}")]
    TokenFetch {
        /// HTTP status code (0 if no response).
        status: u16,
        /// Error description from the response body.
        message: String,
    },

    /// HTTP transport failure reaching the token endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An SDK `connect` call rejected.
    #[error("realtime connect failed: {0}")]
    ConnectFailed(String),
}

/// Result type for realtime operations.
pub type Result<T> = std::result::Result<T, RealtimeError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
