//! Guest gate coordinator.
//!
//! A process-wide UI signal any component can raise to request the
//! "identify yourself" interstitial, without prop drilling. Pure in-memory
//! state: no network, no storage.

use std::sync::Arc;

use tokio::sync::watch;

/// Current gate state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateState {
    /// Whether the interstitial is showing.
    pub visible: bool,
    /// Optional title override.
    pub title: Option<String>,
    /// Optional message override.
    pub message: Option<String>,
    /// Where to return after a successful sign-in.
    pub return_path: Option<String>,
}

/// Optional overrides supplied on open.
#[derive(Debug, Clone, Default)]
pub struct GateOverrides {
    /// Replace the interstitial title.
    pub title: Option<String>,
    /// Replace the interstitial message.
    pub message: Option<String>,
    /// Replace the remembered return destination.
    pub return_path: Option<String>,
}

impl GateOverrides {
    /// Overrides carrying only a return destination.
    pub fn return_to(path: impl Into<String>) -> Self {
        Self {
            return_path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// Cheap-to-clone handle to the process-wide gate signal.
#[derive(Clone)]
pub struct GuestGate {
    tx: Arc<watch::Sender<GateState>>,
}

impl GuestGate {
    /// Create a closed gate.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GateState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Raise the gate, merging any overrides.
    ///
    /// Idempotent: re-opening an already-visible gate with identical
    /// overrides notifies nobody (no queueing).
    pub fn open(&self, overrides: GateOverrides) {
        let _ = self.tx.send_if_modified(|state| {
            let next = GateState {
                visible: true,
                title: overrides.title.clone().or_else(|| state.title.clone()),
                message: overrides.message.clone().or_else(|| state.message.clone()),
                return_path: overrides
                    .return_path
                    .clone()
                    .or_else(|| state.return_path.clone()),
            };
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Dismiss the gate.
    ///
    /// The remembered return path survives so a dismissed gate can be
    /// silently re-opened with the same destination when the triggering
    /// action is retried.
    pub fn close(&self) {
        let _ = self.tx.send_if_modified(|state| {
            if !state.visible {
                return false;
            }
            state.visible = false;
            true
        });
    }

    /// Current state snapshot.
    pub fn state(&self) -> GateState {
        self.tx.borrow().clone()
    }

    /// Subscribe to gate changes.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.tx.subscribe()
    }
}

impl Default for GuestGate {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
