//! # cradle-router
//!
//! Route access control for the cradle session core.
//!
//! The [`RouteGuard`] enforces the guest/authenticated decision table on
//! every navigation or credential change; the [`GuestGate`] is the
//! process-wide signal that raises the "identify yourself" interstitial
//! with a remembered return destination.

#![deny(unsafe_code)]

pub mod gate;
pub mod guard;

pub use gate::{GateOverrides, GateState, GuestGate};
pub use guard::{DeviceRegistrar, GUEST_LANDING, Navigator, RouteGuard};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let gate = GuestGate::new();
        assert!(!gate.state().visible);
        assert_eq!(GUEST_LANDING, "/main/guest");
    }
}
