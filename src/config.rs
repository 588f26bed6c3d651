//! Assistant configuration.
//!
//! Loaded from `~/.config/aria/config.toml` (TOML, all fields optional).
//! Three sections: `[session]` for the live connection, `[confirmation]`
//! for the approval handshake, `[permissions]` for per-tool gating.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AssistantError, Result};
use crate::permissions::PermissionPolicy;

/// Live session connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reconnect automatically when the server drops the session.
    pub reconnect: bool,
    /// First backoff delay after a dropped connection, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for the exponential backoff, in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect: true,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl SessionConfig {
    /// Initial backoff as a [`Duration`].
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Backoff ceiling as a [`Duration`].
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Confirmation handshake settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// How long a confirmation prompt waits before the call is denied.
    pub timeout_secs: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

impl ConfirmationConfig {
    /// Decision timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level assistant configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub session: SessionConfig,
    pub confirmation: ConfirmationConfig,
    pub permissions: PermissionPolicy,
    /// Saved webhook endpoints, `[webhooks]` name → URL.
    pub webhooks: BTreeMap<String, String>,
}

impl AssistantConfig {
    /// Default config file location: `<config dir>/aria/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aria").join("config.toml"))
    }

    /// Load from `path`. A missing file yields the defaults; a present but
    /// malformed file is an error, never silently ignored.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| AssistantError::Config(format!("{}: {e}", path.display())))
    }

    /// Persist to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)
            .map_err(|e| AssistantError::Config(e.to_string()))?;
        std::fs::write(path, rendered)?;
        Ok(())
    }
}
