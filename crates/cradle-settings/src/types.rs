//! Settings type definitions with compiled defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level settings for the cradle session core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CradleSettings {
    /// Backend API settings.
    pub api: ApiSettings,
    /// Realtime token and connection settings.
    pub realtime: RealtimeSettings,
    /// Credential storage settings.
    pub storage: StorageSettings,
}

/// Backend API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL of the backend, no trailing slash.
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.cradle.app".into(),
        }
    }
}

/// Realtime token and connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RealtimeSettings {
    /// Safety margin before realtime-token expiry that forces a refetch.
    pub token_refresh_margin_secs: u64,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            token_refresh_margin_secs: 60,
        }
    }
}

/// Credential storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Directory holding the credential file.
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        Self {
            data_dir: PathBuf::from(home).join(".cradle"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
