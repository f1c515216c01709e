//! Realtime connection manager.
//!
//! Owns exactly one messaging-client instance and one video-client instance
//! and keeps them connected as the credential store's current identity. The
//! manager is a state machine over `(previous_id, current_id)` transitions:
//! a repeated id is a no-op (no socket flap on unrelated re-evaluations), a
//! changed id tears down and reconnects, and identity loss tears down both
//! clients. Connect results carry a generation stamp; a result that resolves
//! after its target was superseded is discarded and its connections undone.
//!
//! Readiness is fail-open: a failed connect attempt still flips `is_ready`
//! so the surrounding UI renders, with the failed handle absent from the
//! snapshot ("realtime features unavailable" rather than a hang).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cradle_auth::CredentialState;
use cradle_core::Identity;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::clients::{ChatClient, RealtimeTokenSource, VideoClient};

/// Connection lifecycle states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No identity; both handles are down.
    Disconnected,
    /// Identity present, connect attempt outstanding.
    Connecting,
    /// Both clients connected as the current identity.
    Ready,
    /// A connect attempt errored; readiness is still flipped.
    Failed {
        /// What went wrong, for observability.
        reason: String,
    },
}

/// Read-only snapshot of the manager, published over a watch channel.
#[derive(Clone)]
pub struct RealtimeSnapshot {
    /// The messaging client, present only when its connect succeeded.
    pub chat: Option<Arc<dyn ChatClient>>,
    /// The video client, present only when its connect succeeded.
    pub video: Option<Arc<dyn VideoClient>>,
    /// Current lifecycle state.
    pub state: ConnectionState,
    /// Gate for realtime-dependent rendering. True once a connect attempt
    /// has settled, successfully or not.
    pub is_ready: bool,
    /// True when no identity is signed in.
    pub is_guest: bool,
}

impl RealtimeSnapshot {
    fn disconnected() -> Self {
        Self {
            chat: None,
            video: None,
            state: ConnectionState::Disconnected,
            is_ready: false,
            is_guest: true,
        }
    }

    fn connecting() -> Self {
        Self {
            chat: None,
            video: None,
            state: ConnectionState::Connecting,
            is_ready: false,
            is_guest: false,
        }
    }
}

impl fmt::Debug for RealtimeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeSnapshot")
            .field("state", &self.state)
            .field("is_ready", &self.is_ready)
            .field("is_guest", &self.is_guest)
            .field("has_chat", &self.chat.is_some())
            .field("has_video", &self.video.is_some())
            .finish()
    }
}

/// Keeps the chat/video client pair connected as the current identity.
///
/// Consumers read the derived [`RealtimeSnapshot`]; only the manager mutates
/// the clients.
pub struct ConnectionManager {
    chat: Arc<dyn ChatClient>,
    video: Arc<dyn VideoClient>,
    tokens: Arc<dyn RealtimeTokenSource>,
    /// Identity id of the outstanding connect attempt, if any.
    in_flight: parking_lot::Mutex<Option<String>>,
    /// Bumped whenever the target identity changes; connect results from an
    /// older generation are stale.
    generation: AtomicU64,
    tx: watch::Sender<RealtimeSnapshot>,
}

impl ConnectionManager {
    /// Create a manager owning the given client pair.
    pub fn new(
        chat: Arc<dyn ChatClient>,
        video: Arc<dyn VideoClient>,
        tokens: Arc<dyn RealtimeTokenSource>,
    ) -> Self {
        let (tx, _rx) = watch::channel(RealtimeSnapshot::disconnected());
        Self {
            chat,
            video,
            tokens,
            in_flight: parking_lot::Mutex::new(None),
            generation: AtomicU64::new(0),
            tx,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> RealtimeSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<RealtimeSnapshot> {
        self.tx.subscribe()
    }

    /// Drive the state machine towards the given identity.
    ///
    /// Safe to call repeatedly with the same value; only transitions act.
    #[tracing::instrument(skip_all)]
    pub async fn apply_identity(&self, identity: Option<Identity>) {
        match identity {
            Some(identity) => self.connect_as(identity).await,
            None => self.disconnect_all().await,
        }
    }

    /// Background loop wiring the credential store to the state machine.
    ///
    /// Evaluations before hydration are skipped. Exits when the credential
    /// store is dropped or the token is cancelled.
    #[tracing::instrument(skip_all, name = "connection_manager")]
    pub async fn run(
        self: Arc<Self>,
        mut credentials: watch::Receiver<CredentialState>,
        cancel: CancellationToken,
    ) {
        loop {
            let state = credentials.borrow_and_update().clone();
            if state.hydrated {
                self.apply_identity(state.identity).await;
            }
            tokio::select! {
                changed = credentials.changed() => {
                    if changed.is_err() {
                        tracing::info!("credential store dropped, stopping");
                        break;
                    }
                }
                () = cancel.cancelled() => break,
            }
        }
    }

    async fn connect_as(&self, identity: Identity) {
        // Repeated id: the chat client is already connected as the target,
        // leave the sockets alone.
        if self.chat.connected_user_id().as_deref() == Some(identity.id.as_str()) {
            return;
        }

        let generation = {
            let mut in_flight = self.in_flight.lock();
            if in_flight.as_deref() == Some(identity.id.as_str()) {
                // An attempt for this id is already outstanding.
                return;
            }
            *in_flight = Some(identity.id.clone());
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        // Changed id: the previous user's connections come down first, and
        // any token cached for them is dropped.
        if self.chat.connected_user_id().is_some() {
            self.teardown_clients().await;
        }
        self.tokens.invalidate().await;

        let _ = self.tx.send_replace(RealtimeSnapshot::connecting());
        tracing::info!(user_id = %identity.id, "connecting realtime clients");

        let chat_result = self.chat.connect_user(&identity, self.tokens.clone()).await;
        let video_result = self.video.connect_user(&identity, self.tokens.clone()).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(user_id = %identity.id, "connect result superseded, discarding");
            if self.chat.connected_user_id().as_deref() == Some(identity.id.as_str()) {
                self.teardown_clients().await;
            }
            return;
        }
        *self.in_flight.lock() = None;

        let chat_ok = chat_result.is_ok();
        let video_ok = video_result.is_ok();
        let snapshot = if chat_ok && video_ok {
            tracing::info!(user_id = %identity.id, "realtime clients ready");
            RealtimeSnapshot {
                chat: Some(self.chat.clone()),
                video: Some(self.video.clone()),
                state: ConnectionState::Ready,
                is_ready: true,
                is_guest: false,
            }
        } else {
            let reason = [
                chat_result.err().map(|e| format!("chat: {e}")),
                video_result.err().map(|e| format!("video: {e}")),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("; ");
            tracing::error!(user_id = %identity.id, %reason, "realtime connect failed");
            RealtimeSnapshot {
                chat: chat_ok.then(|| self.chat.clone()),
                video: video_ok.then(|| self.video.clone()),
                state: ConnectionState::Failed { reason },
                is_ready: true,
                is_guest: false,
            }
        };
        let _ = self.tx.send_replace(snapshot);
    }

    async fn disconnect_all(&self) {
        // Supersede any outstanding connect attempt.
        let _ = self.generation.fetch_add(1, Ordering::SeqCst);
        *self.in_flight.lock() = None;

        if self.chat.connected_user_id().is_none()
            && self.tx.borrow().state == ConnectionState::Disconnected
        {
            // Already fully down; repeated guest evaluations are no-ops.
            return;
        }

        tracing::info!("identity lost, tearing down realtime clients");
        self.teardown_clients().await;
        self.tokens.invalidate().await;
        let _ = self.tx.send_replace(RealtimeSnapshot::disconnected());
    }

    async fn teardown_clients(&self) {
        if let Err(e) = self.chat.disconnect_user().await {
            tracing::warn!("chat disconnect failed: {e}");
        }
        if let Err(e) = self.video.disconnect_user().await {
            tracing::warn!("video disconnect failed: {e}");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
