//! Per-tool confirmation policy.
//!
//! The [`PermissionPolicy`] maps tool names to a single flag: does running
//! this tool require explicit user confirmation? A tool with no entry
//! defaults to **requiring confirmation** — unknown or newly added tools
//! are confirm-by-default, so growing the capability surface never silently
//! widens what executes unattended.
//!
//! ## Live policy handle
//!
//! [`SharedPermissionPolicy`] is an `Arc<Mutex<PermissionPolicy>>` shared
//! between the settings channel (which mutates it at runtime) and the tool
//! registry (which reads it on every dispatch, never caching at startup).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// A thread-safe, live-view policy handle.
///
/// Every clone observes the same policy, so a runtime settings update is
/// immediately visible to the next dispatch.
pub type SharedPermissionPolicy = Arc<Mutex<PermissionPolicy>>;

/// Mapping of tool name to `requires_confirmation`.
///
/// Serializes to `config.toml` under `[permissions]`, one key per tool:
///
/// ```toml
/// [permissions]
/// pc_read_file = false
/// webhook_send = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionPolicy {
    /// Explicit per-tool overrides. Absent entries require confirmation.
    rules: BTreeMap<String, bool>,
}

impl PermissionPolicy {
    /// Whether running `tool` requires user confirmation.
    ///
    /// Absent entries default to `true` (fail closed).
    pub fn requires_confirmation(&self, tool: &str) -> bool {
        self.rules.get(tool).copied().unwrap_or(true)
    }

    /// Set the confirmation requirement for one tool.
    pub fn set(&mut self, tool: impl Into<String>, requires_confirmation: bool) {
        self.rules.insert(tool.into(), requires_confirmation);
    }

    /// Mark a tool as safe to run without confirmation.
    pub fn allow_unconfirmed(&mut self, tool: impl Into<String>) {
        self.set(tool, false);
    }

    /// Remove a tool's override, reverting it to the confirm-by-default rule.
    pub fn clear(&mut self, tool: &str) {
        self.rules.remove(tool);
    }

    /// Read-only view of the explicit overrides.
    pub fn rules(&self) -> &BTreeMap<String, bool> {
        &self.rules
    }

    /// Convert this policy into a [`SharedPermissionPolicy`].
    #[must_use]
    pub fn into_shared(self) -> SharedPermissionPolicy {
        Arc::new(Mutex::new(self))
    }

    /// Create a default (everything confirm-gated) shared policy.
    #[must_use]
    pub fn default_shared() -> SharedPermissionPolicy {
        Self::default().into_shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_entry_requires_confirmation() {
        let policy = PermissionPolicy::default();
        assert!(policy.requires_confirmation("anything"));
    }

    #[test]
    fn explicit_false_skips_confirmation() {
        let mut policy = PermissionPolicy::default();
        policy.allow_unconfirmed("echo");
        assert!(!policy.requires_confirmation("echo"));
        assert!(policy.requires_confirmation("danger"));
    }

    #[test]
    fn explicit_true_matches_default() {
        let mut policy = PermissionPolicy::default();
        policy.set("danger", true);
        assert!(policy.requires_confirmation("danger"));
    }

    #[test]
    fn clear_reverts_to_default() {
        let mut policy = PermissionPolicy::default();
        policy.allow_unconfirmed("echo");
        assert!(!policy.requires_confirmation("echo"));

        policy.clear("echo");
        assert!(policy.requires_confirmation("echo"));
    }

    #[test]
    fn shared_policy_reflects_runtime_update() {
        let shared = PermissionPolicy::default_shared();
        let clone = Arc::clone(&shared);

        shared
            .lock()
            .expect("policy lock")
            .allow_unconfirmed("chat_send_message");

        assert!(
            !clone
                .lock()
                .expect("policy lock")
                .requires_confirmation("chat_send_message"),
            "cloned handle should see runtime update"
        );
    }

    #[test]
    fn toml_roundtrip() {
        let mut policy = PermissionPolicy::default();
        policy.allow_unconfirmed("pc_read_file");
        policy.set("webhook_send", true);

        let rendered = toml::to_string(&policy).expect("serialize");
        let parsed: PermissionPolicy = toml::from_str(&rendered).expect("parse");
        assert!(!parsed.requires_confirmation("pc_read_file"));
        assert!(parsed.requires_confirmation("webhook_send"));
        assert!(parsed.requires_confirmation("unlisted"));
    }
}
