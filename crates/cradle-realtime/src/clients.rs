//! Collaborator traits for the external realtime SDKs.
//!
//! The messaging and video SDKs are consumed, not reimplemented: the
//! connection manager only needs their connect/disconnect contracts and a
//! token source to hand them. Concrete implementations live at the app's
//! edge; tests use fakes.

use std::sync::Arc;

use async_trait::async_trait;
use cradle_core::Identity;

use crate::errors::Result;

/// Supplies realtime bearer tokens to the SDK clients on demand.
///
/// Implemented by [`crate::token::TokenCache`]; the SDKs call it lazily
/// whenever they need a (fresh) credential.
#[async_trait]
pub trait RealtimeTokenSource: Send + Sync {
    /// A realtime token valid for the current session.
    async fn realtime_token(&self) -> Result<String>;

    /// Drop any cached token. Called on identity transitions so a token
    /// issued for one user is never handed to the next.
    async fn invalidate(&self) {}
}

/// The messaging SDK.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Connect the client as the given identity.
    async fn connect_user(
        &self,
        identity: &Identity,
        tokens: Arc<dyn RealtimeTokenSource>,
    ) -> Result<()>;

    /// Disconnect the current user, if any.
    async fn disconnect_user(&self) -> Result<()>;

    /// Id of the currently connected user, if connected.
    fn connected_user_id(&self) -> Option<String>;
}

/// The audio/video SDK.
#[async_trait]
pub trait VideoClient: Send + Sync {
    /// Get-or-create the client instance for the given identity and connect.
    async fn connect_user(
        &self,
        identity: &Identity,
        tokens: Arc<dyn RealtimeTokenSource>,
    ) -> Result<()>;

    /// Disconnect the current user, if any.
    async fn disconnect_user(&self) -> Result<()>;
}
