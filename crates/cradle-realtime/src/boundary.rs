//! Realtime provider boundary.
//!
//! The boundary sits near the application root and decides, from the
//! connection manager's snapshot, whether realtime-dependent children may
//! render. Guests pass straight through (guest mode is a first-class,
//! non-degraded path); signed-in users are blocked until readiness settles;
//! a settled-but-dead connection renders children without the realtime
//! context instead of crashing them.

use std::fmt;
use std::sync::Arc;

use crate::clients::{ChatClient, VideoClient};
use crate::manager::RealtimeSnapshot;

/// What the boundary should render.
pub enum BoundaryDecision {
    /// No identity: children render directly, no realtime context.
    Passthrough,
    /// Identity present but the connection has not settled: render a
    /// blocking placeholder so no child observes a missing context.
    Blocked,
    /// The connection settled with neither handle usable: children render
    /// without the context wrapper (realtime features unavailable).
    Degraded,
    /// Children render inside the realtime context with the usable handles.
    Realtime {
        /// Messaging handle, if its connect succeeded.
        chat: Option<Arc<dyn ChatClient>>,
        /// Video handle, if its connect succeeded.
        video: Option<Arc<dyn VideoClient>>,
    },
}

impl BoundaryDecision {
    /// Derive the render decision from a manager snapshot.
    pub fn decide(snapshot: &RealtimeSnapshot) -> Self {
        if snapshot.is_guest {
            return Self::Passthrough;
        }
        if !snapshot.is_ready {
            return Self::Blocked;
        }
        match (&snapshot.chat, &snapshot.video) {
            (None, None) => Self::Degraded,
            (chat, video) => Self::Realtime {
                chat: chat.clone(),
                video: video.clone(),
            },
        }
    }
}

impl fmt::Debug for BoundaryDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passthrough => write!(f, "Passthrough"),
            Self::Blocked => write!(f, "Blocked"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Realtime { chat, video } => f
                .debug_struct("Realtime")
                .field("has_chat", &chat.is_some())
                .field("has_video", &video.is_some())
                .finish(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
