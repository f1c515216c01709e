//! The credential store: single source of truth for the current identity
//! and session token.
//!
//! State is published through a `tokio::sync::watch` channel so the route
//! guard and connection manager can observe sign-in/out transitions without
//! polling. The store never returns an error to callers: storage failures
//! are logged and surfaced as empty/absent state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cradle_core::{Identity, SessionToken};
use tokio::sync::watch;

use crate::storage::SecureStorage;

/// Storage key for the persisted identity JSON.
const KEY_IDENTITY: &str = "identity";
/// Storage key for the persisted session token.
const KEY_SESSION_TOKEN: &str = "session_token";

/// Read-only snapshot of the credential store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialState {
    /// The signed-in user, if any.
    pub identity: Option<Identity>,
    /// The persisted bearer credential, if any.
    pub session_token: Option<SessionToken>,
    /// Whether the startup hydration step has completed (or failed).
    pub hydrated: bool,
}

impl CredentialState {
    /// The current identity id, if signed in.
    pub fn identity_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.id.as_str())
    }

    /// Whether the session token exists and has not expired at `now_ms`.
    ///
    /// An expired or undecodable token counts as absent.
    pub fn session_valid(&self, now_ms: i64) -> bool {
        self.session_token
            .as_ref()
            .is_some_and(|t| t.is_valid(now_ms))
    }
}

/// Persisted holder for the current identity and session token.
///
/// Mutated only by sign-in, sign-out, and the API layer's
/// unauthorized-response handler; everything else observes via
/// [`CredentialStore::subscribe`].
pub struct CredentialStore {
    storage: Arc<dyn SecureStorage>,
    tx: watch::Sender<CredentialState>,
    hydrate_started: AtomicBool,
}

impl CredentialStore {
    /// Create a store over the given storage backend. State is empty and
    /// un-hydrated until [`CredentialStore::hydrate`] runs.
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        let (tx, _rx) = watch::channel(CredentialState::default());
        Self {
            storage,
            tx,
            hydrate_started: AtomicBool::new(false),
        }
    }

    /// Load persisted credentials into memory.
    ///
    /// Runs at most once per process; later calls are no-ops. Always leaves
    /// `hydrated = true`, even when storage is unreadable, so dependents
    /// never block forever.
    #[tracing::instrument(skip_all)]
    pub async fn hydrate(&self) {
        if self.hydrate_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let identity = match self.storage.get(KEY_IDENTITY).await {
            Ok(Some(json)) => match serde_json::from_str::<Identity>(&json) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    tracing::warn!("stored identity unparseable, treating as absent: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("identity hydration failed, treating as absent: {e}");
                None
            }
        };

        let session_token = match self.storage.get(KEY_SESSION_TOKEN).await {
            Ok(opt) => opt.map(SessionToken::new),
            Err(e) => {
                tracing::warn!("session token hydration failed, treating as absent: {e}");
                None
            }
        };

        self.tx.send_modify(|state| {
            state.identity = identity;
            state.session_token = session_token;
            state.hydrated = true;
        });
    }

    /// Replace the identity wholesale and persist it best-effort.
    pub async fn set_identity(&self, identity: Option<Identity>) {
        match &identity {
            Some(identity) => match serde_json::to_string(identity) {
                Ok(json) => self.persist_set(KEY_IDENTITY, &json).await,
                Err(e) => tracing::warn!("identity not persistable: {e}"),
            },
            None => self.persist_remove(KEY_IDENTITY).await,
        }
        self.tx.send_modify(|state| state.identity = identity);
    }

    /// Replace the session token wholesale and persist it best-effort.
    pub async fn set_session_token(&self, token: Option<SessionToken>) {
        match &token {
            Some(token) => self.persist_set(KEY_SESSION_TOKEN, token.as_str()).await,
            None => self.persist_remove(KEY_SESSION_TOKEN).await,
        }
        self.tx.send_modify(|state| state.session_token = token);
    }

    /// Atomically null both identity and session token.
    ///
    /// Used on sign-out and on an authorization rejection from the API layer.
    pub async fn clear(&self) {
        self.persist_remove(KEY_IDENTITY).await;
        self.persist_remove(KEY_SESSION_TOKEN).await;
        self.tx.send_modify(|state| {
            state.identity = None;
            state.session_token = None;
        });
    }

    /// API-layer hook for a 401 response: drop credentials.
    ///
    /// The resulting state change cascades into the route guard redirect and
    /// the connection manager teardown through the watch channel.
    pub async fn handle_unauthorized(&self) {
        tracing::warn!("API rejected session, clearing credentials");
        self.clear().await;
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> CredentialState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<CredentialState> {
        self.tx.subscribe()
    }

    async fn persist_set(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value).await {
            tracing::warn!(key, "credential persist failed: {e}");
        }
    }

    async fn persist_remove(&self, key: &str) {
        if let Err(e) = self.storage.remove(key).await {
            tracing::warn!(key, "credential removal failed: {e}");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AuthError, Result};
    use crate::storage::FileStorage;
    use async_trait::async_trait;
    use cradle_core::Role;
    use tempfile::TempDir;

    fn make_identity() -> Identity {
        Identity {
            id: "42".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: Role::PregnantWoman,
        }
    }

    fn file_store(dir: &TempDir) -> CredentialStore {
        CredentialStore::new(Arc::new(FileStorage::new(dir.path())))
    }

    /// Storage backend that fails every operation.
    struct BrokenStorage;

    #[async_trait]
    impl SecureStorage for BrokenStorage {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AuthError::Io(std::io::Error::other("disk on fire")))
        }
        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(AuthError::Io(std::io::Error::other("disk on fire")))
        }
        async fn remove(&self, _key: &str) -> Result<()> {
            Err(AuthError::Io(std::io::Error::other("disk on fire")))
        }
    }

    #[tokio::test]
    async fn starts_unhydrated_and_empty() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        let state = store.snapshot();
        assert!(!state.hydrated);
        assert_eq!(state.identity, None);
        assert_eq!(state.session_token, None);
    }

    #[tokio::test]
    async fn hydrate_empty_storage_sets_flag() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        store.hydrate().await;
        let state = store.snapshot();
        assert!(state.hydrated);
        assert_eq!(state.identity, None);
    }

    #[tokio::test]
    async fn hydrate_loads_persisted_credentials() {
        let dir = TempDir::new().unwrap();
        {
            let store = file_store(&dir);
            store.set_identity(Some(make_identity())).await;
            store.set_session_token(Some(SessionToken::new("tok"))).await;
        }
        let store = file_store(&dir);
        store.hydrate().await;
        let state = store.snapshot();
        assert_eq!(state.identity_id(), Some("42"));
        assert_eq!(state.session_token, Some(SessionToken::new("tok")));
    }

    #[tokio::test]
    async fn hydrate_failure_still_sets_flag() {
        let store = CredentialStore::new(Arc::new(BrokenStorage));
        store.hydrate().await;
        let state = store.snapshot();
        assert!(state.hydrated);
        assert_eq!(state.identity, None);
        assert_eq!(state.session_token, None);
    }

    #[tokio::test]
    async fn hydrate_runs_once() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        store.hydrate().await;
        store.set_identity(Some(make_identity())).await;
        // A second hydrate must not reload (and so not clobber) live state.
        store.hydrate().await;
        assert_eq!(store.snapshot().identity_id(), Some("42"));
    }

    #[tokio::test]
    async fn setters_survive_broken_storage() {
        let store = CredentialStore::new(Arc::new(BrokenStorage));
        store.set_identity(Some(make_identity())).await;
        store.set_session_token(Some(SessionToken::new("tok"))).await;
        // In-memory state updated even though persistence failed.
        assert_eq!(store.snapshot().identity_id(), Some("42"));
    }

    #[tokio::test]
    async fn clear_nulls_both() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        store.set_identity(Some(make_identity())).await;
        store.set_session_token(Some(SessionToken::new("tok"))).await;
        store.clear().await;
        let state = store.snapshot();
        assert_eq!(state.identity, None);
        assert_eq!(state.session_token, None);
    }

    #[tokio::test]
    async fn unauthorized_clears_credentials() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        store.set_identity(Some(make_identity())).await;
        store.handle_unauthorized().await;
        assert_eq!(store.snapshot().identity, None);
    }

    #[tokio::test]
    async fn subscribers_observe_sign_out() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        let mut rx = store.subscribe();
        store.set_identity(Some(make_identity())).await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().identity_id(), Some("42"));
        store.clear().await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().identity, None);
    }

    #[test]
    fn session_valid_requires_decodable_unexpired_token() {
        let state = CredentialState {
            session_token: Some(SessionToken::new("garbage")),
            ..Default::default()
        };
        assert!(!state.session_valid(0));
        let state = CredentialState::default();
        assert!(!state.session_valid(0));
    }
}
