//! # cradle-auth
//!
//! Persisted credential store for the cradle session core.
//!
//! Holds the current [`cradle_core::Identity`] and session token behind an
//! opaque secure key-value backend, hydrates exactly once at process start,
//! and publishes every change over a watch channel. Storage failures never
//! propagate: they surface as empty state so dependents cannot block or
//! crash on a bad disk.

#![deny(unsafe_code)]

pub mod errors;
pub mod storage;
pub mod store;

pub use errors::{AuthError, Result};
pub use storage::{FileStorage, SecureStorage};
pub use store::{CredentialState, CredentialStore};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
