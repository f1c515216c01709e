//! # cradle-realtime
//!
//! Realtime-connection lifecycle for the cradle session core.
//!
//! Wraps the external messaging and video SDKs behind the [`ChatClient`] and
//! [`VideoClient`] traits, caches the SDK-scoped realtime token in memory
//! with proactive refresh, and keeps both clients connected as exactly one
//! identity via the [`ConnectionManager`] state machine. The
//! [`BoundaryDecision`] tells the UI layer whether realtime-dependent
//! children may render.

#![deny(unsafe_code)]

pub mod boundary;
pub mod clients;
pub mod errors;
pub mod manager;
pub mod token;

pub use boundary::BoundaryDecision;
pub use clients::{ChatClient, RealtimeTokenSource, VideoClient};
pub use errors::{RealtimeError, Result};
pub use manager::{ConnectionManager, ConnectionState, RealtimeSnapshot};
pub use token::{HttpTokenFetcher, RealtimeTokenFetcher, TokenCache};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
