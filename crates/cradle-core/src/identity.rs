//! The authenticated user's role-bearing profile record.

use serde::{Deserialize, Serialize};

/// Closed set of account roles.
///
/// Wire names match the backend's SCREAMING_SNAKE representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// An expecting mother (the primary consumer role).
    PregnantWoman,
    /// A consulting doctor.
    Doctor,
    /// A nurse or midwife.
    Nurse,
    /// A back-office administrator.
    Admin,
}

impl Role {
    /// The role-specific home area the router lands signed-in users on.
    pub fn home_area(self) -> &'static str {
        match self {
            Role::PregnantWoman => "/main/mother",
            Role::Doctor => "/main/doctor",
            Role::Nurse => "/main/nurse",
            Role::Admin => "/main/admin",
        }
    }
}

/// The authenticated user.
///
/// Owned by the credential store and replaced wholesale on sign-in/out;
/// no other component partially mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable account id.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Account role.
    pub role: Role,
}

impl Identity {
    /// Full display name, `"First Last"`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
