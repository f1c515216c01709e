//! Route guard.
//!
//! Re-evaluated on every navigation change and on every credential change,
//! once hydration has completed. The guard decides whether the current
//! screen is permitted, redirects when it is not, and raises the guest gate
//! with the interrupted destination. Evaluations are idempotent: re-running
//! for the same state produces the same (harmless) outcome.

use std::sync::Arc;

use async_trait::async_trait;
use cradle_auth::CredentialState;
use cradle_core::{Identity, now_ms};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::gate::{GateOverrides, GuestGate};

/// The guest landing screen.
pub const GUEST_LANDING: &str = "/main/guest";

/// Navigation layer collaborator.
pub trait Navigator: Send + Sync {
    /// Replace the current location (no history entry).
    fn replace(&self, path: &str);
}

/// Backend device-registration collaborator. Fire-and-forget only.
#[async_trait]
pub trait DeviceRegistrar: Send + Sync {
    /// Register this device for the given identity.
    async fn register_device(&self, identity: &Identity) -> anyhow::Result<()>;
}

/// Whether the path is inside the protected `/main` area.
fn is_protected(path: &str) -> bool {
    path == "/main" || path.starts_with("/main/")
}

/// Whether the path is the guest landing or one of its sub-routes.
fn is_guest_subroute(path: &str) -> bool {
    path == GUEST_LANDING || path.starts_with("/main/guest/")
}

/// Whether the path is in the intro/auth area.
fn is_intro(path: &str) -> bool {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .is_some_and(|segment| segment == "(intro)")
}

/// Subscribes to credentials + location and enforces the access table.
pub struct RouteGuard {
    navigator: Arc<dyn Navigator>,
    registrar: Arc<dyn DeviceRegistrar>,
    gate: GuestGate,
}

impl RouteGuard {
    /// Create a guard over the given collaborators.
    pub fn new(
        navigator: Arc<dyn Navigator>,
        registrar: Arc<dyn DeviceRegistrar>,
        gate: GuestGate,
    ) -> Self {
        Self {
            navigator,
            registrar,
            gate,
        }
    }

    /// Evaluate the current location against the credential snapshot.
    ///
    /// No-op before hydration, to avoid redirect flicker while persisted
    /// credentials are still loading.
    #[tracing::instrument(skip_all, fields(path))]
    pub fn evaluate(&self, path: &str, credentials: &CredentialState, now_ms: i64) {
        if !credentials.hydrated {
            return;
        }

        if let Some(identity) = &credentials.identity {
            self.spawn_device_registration(identity);
        }

        let session_valid = credentials.session_valid(now_ms);

        if is_protected(path) && !is_guest_subroute(path) {
            if !session_valid {
                tracing::info!(path, "unauthenticated on protected route, gating");
                self.gate.open(GateOverrides::return_to(path));
                self.navigator.replace(GUEST_LANDING);
            }
            return;
        }

        if (is_intro(path) || is_guest_subroute(path)) && session_valid {
            if let Some(identity) = &credentials.identity {
                let home = identity.role.home_area();
                tracing::info!(path, home, "signed in on guest route, going home");
                self.navigator.replace(home);
            }
        }
    }

    /// Background loop re-evaluating on every credential or location change.
    pub async fn run(
        self: Arc<Self>,
        mut credentials: watch::Receiver<CredentialState>,
        mut location: watch::Receiver<String>,
        cancel: CancellationToken,
    ) {
        loop {
            let path = location.borrow_and_update().clone();
            let state = credentials.borrow_and_update().clone();
            self.evaluate(&path, &state, now_ms());
            tokio::select! {
                changed = credentials.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = location.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = cancel.cancelled() => break,
            }
        }
    }

    /// Detached device registration; its failure never affects navigation.
    fn spawn_device_registration(&self, identity: &Identity) {
        let registrar = self.registrar.clone();
        let identity = identity.clone();
        let _ = tokio::spawn(async move {
            if let Err(e) = registrar.register_device(&identity).await {
                tracing::warn!(user_id = %identity.id, "device registration failed: {e}");
            }
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use cradle_core::{Role, SessionToken};

    fn make_identity(role: Role) -> Identity {
        Identity {
            id: "42".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role,
        }
    }

    /// Unsigned JWT expiring at the given epoch-seconds instant.
    fn make_jwt(exp_secs: i64) -> SessionToken {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::json!({ "exp": exp_secs }).to_string());
        SessionToken::new(format!("{header}.{payload}.sig"))
    }

    const NOW_MS: i64 = 1_700_000_000_000;

    fn signed_in_state(role: Role) -> CredentialState {
        CredentialState {
            identity: Some(make_identity(role)),
            session_token: Some(make_jwt(NOW_MS / 1000 + 3600)),
            hydrated: true,
        }
    }

    fn guest_state() -> CredentialState {
        CredentialState {
            identity: None,
            session_token: None,
            hydrated: true,
        }
    }

    #[derive(Default)]
    struct FakeNavigator {
        replaces: parking_lot::Mutex<Vec<String>>,
    }

    impl FakeNavigator {
        fn replaced(&self) -> Vec<String> {
            self.replaces.lock().clone()
        }
    }

    impl Navigator for FakeNavigator {
        fn replace(&self, path: &str) {
            self.replaces.lock().push(path.to_string());
        }
    }

    #[derive(Default)]
    struct FakeRegistrar {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DeviceRegistrar for FakeRegistrar {
        async fn register_device(&self, _identity: &Identity) -> anyhow::Result<()> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("registration endpoint down");
            }
            Ok(())
        }
    }

    struct Harness {
        navigator: Arc<FakeNavigator>,
        registrar: Arc<FakeRegistrar>,
        gate: GuestGate,
        guard: RouteGuard,
    }

    fn harness() -> Harness {
        harness_with_registrar(FakeRegistrar::default())
    }

    fn harness_with_registrar(registrar: FakeRegistrar) -> Harness {
        let navigator = Arc::new(FakeNavigator::default());
        let registrar = Arc::new(registrar);
        let gate = GuestGate::new();
        let guard = RouteGuard::new(navigator.clone(), registrar.clone(), gate.clone());
        Harness {
            navigator,
            registrar,
            gate,
            guard,
        }
    }

    #[tokio::test]
    async fn no_op_before_hydration() {
        let h = harness();
        let state = CredentialState::default();
        h.guard.evaluate("/main/mother/home", &state, NOW_MS);
        assert!(h.navigator.replaced().is_empty());
        assert!(!h.gate.state().visible);
    }

    #[tokio::test]
    async fn fresh_install_protected_route_redirects_to_guest() {
        let h = harness();
        h.guard.evaluate("/main/mother/home", &guest_state(), NOW_MS);

        assert_eq!(h.navigator.replaced(), vec![GUEST_LANDING.to_string()]);
        let gate = h.gate.state();
        assert!(gate.visible);
        assert_eq!(gate.return_path.as_deref(), Some("/main/mother/home"));
    }

    #[tokio::test]
    async fn expired_session_counts_as_unauthenticated() {
        let h = harness();
        let state = CredentialState {
            identity: Some(make_identity(Role::PregnantWoman)),
            session_token: Some(make_jwt(NOW_MS / 1000 - 10)),
            hydrated: true,
        };
        h.guard.evaluate("/main/mother/home", &state, NOW_MS);
        assert_eq!(h.navigator.replaced(), vec![GUEST_LANDING.to_string()]);
    }

    #[tokio::test]
    async fn valid_session_on_protected_route_stays_put() {
        let h = harness();
        h.guard.evaluate(
            "/main/mother/home",
            &signed_in_state(Role::PregnantWoman),
            NOW_MS,
        );
        assert!(h.navigator.replaced().is_empty());
        assert!(!h.gate.state().visible);
    }

    #[tokio::test]
    async fn signed_in_on_login_goes_to_role_home() {
        let h = harness();
        h.guard.evaluate(
            "/(intro)/login",
            &signed_in_state(Role::PregnantWoman),
            NOW_MS,
        );
        assert_eq!(h.navigator.replaced(), vec!["/main/mother".to_string()]);
    }

    #[tokio::test]
    async fn signed_in_on_guest_subroute_goes_to_role_home() {
        let h = harness();
        h.guard
            .evaluate("/main/guest/browse", &signed_in_state(Role::Doctor), NOW_MS);
        assert_eq!(h.navigator.replaced(), vec!["/main/doctor".to_string()]);
    }

    #[tokio::test]
    async fn guest_on_intro_stays_put() {
        let h = harness();
        h.guard.evaluate("/(intro)/login", &guest_state(), NOW_MS);
        assert!(h.navigator.replaced().is_empty());
        assert!(!h.gate.state().visible);
    }

    #[tokio::test]
    async fn guest_on_guest_landing_stays_put() {
        let h = harness();
        h.guard.evaluate(GUEST_LANDING, &guest_state(), NOW_MS);
        assert!(h.navigator.replaced().is_empty());
    }

    #[tokio::test]
    async fn registration_fires_for_signed_in_identity() {
        let h = harness();
        h.guard.evaluate(
            "/main/mother/home",
            &signed_in_state(Role::PregnantWoman),
            NOW_MS,
        );
        // Let the detached task run.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(h.registrar.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn registration_failure_never_affects_navigation() {
        let h = harness_with_registrar(FakeRegistrar {
            fail: true,
            ..Default::default()
        });
        h.guard.evaluate(
            "/main/mother/home",
            &signed_in_state(Role::PregnantWoman),
            NOW_MS,
        );
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(h.registrar.calls.load(Ordering::SeqCst), 1);
        assert!(h.navigator.replaced().is_empty());
        assert!(!h.gate.state().visible);
    }

    #[tokio::test]
    async fn evaluation_is_idempotent() {
        let h = harness();
        h.guard.evaluate("/main/mother/home", &guest_state(), NOW_MS);
        h.guard.evaluate("/main/mother/home", &guest_state(), NOW_MS);
        // Navigation repeats harmlessly; the gate does not re-notify.
        assert_eq!(h.navigator.replaced().len(), 2);
        assert!(h.gate.state().visible);
    }

    #[test]
    fn area_classification() {
        assert!(is_protected("/main/mother/home"));
        assert!(is_protected("/main"));
        assert!(!is_protected("/(intro)/login"));
        assert!(is_guest_subroute("/main/guest"));
        assert!(is_guest_subroute("/main/guest/browse"));
        assert!(!is_guest_subroute("/main/guestbook"));
        assert!(is_intro("/(intro)/login"));
        assert!(!is_intro("/main/guest"));
    }
}
