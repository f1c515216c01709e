//! # cradle-core
//!
//! Shared domain types for the cradle session and realtime core.
//!
//! Defines the authenticated [`Identity`] with its closed [`Role`] set, the
//! persisted [`SessionToken`] bearer credential with defensive expiry
//! decoding, wall-clock helpers, and the tracing init used by binaries and
//! integration tests.

#![deny(unsafe_code)]

pub mod identity;
pub mod telemetry;
pub mod time;
pub mod token;

pub use identity::{Identity, Role};
pub use telemetry::init_tracing;
pub use time::now_ms;
pub use token::{SessionToken, decode_expiry_ms};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _role = Role::PregnantWoman;
        let _now = now_ms();
    }
}
