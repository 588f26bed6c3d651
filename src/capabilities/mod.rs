//! Capability surfaces bound to tools.
//!
//! Each submodule owns one slice of the outside world (files, calendar,
//! mail, printing, messaging, smart lights, spreadsheets, webhooks)
//! behind an async
//! trait, and exposes a `bundle(...)` constructor that packages the
//! trait object into `(definition, handler)` pairs ready to register.
//! The registry never sees the capability objects themselves.

use std::sync::Arc;

use crate::tools::{ArgMap, ToolDefinition, ToolError, ToolHandler, ToolRegistry};

pub mod calendar;
pub mod files;
pub mod lights;
pub mod mail;
pub mod messaging;
pub mod printer;
pub mod spreadsheet;
pub mod webhook;

/// Errors a capability backend can produce. Converted into
/// [`ToolError::HandlerFailure`] at the handler boundary, so dispatch
/// surfaces them as structured error results.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The named resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An argument was present but unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backend is not reachable or not configured.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The backend failed while performing the action.
    #[error("{0}")]
    Backend(String),
}

impl From<CapabilityError> for ToolError {
    fn from(err: CapabilityError) -> Self {
        ToolError::HandlerFailure(err.to_string())
    }
}

/// A set of `(definition, handler)` pairs from one capability module.
#[derive(Default)]
pub struct CapabilityBundle {
    entries: Vec<(ToolDefinition, Arc<dyn ToolHandler>)>,
}

impl CapabilityBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one tool to the bundle.
    pub fn push(&mut self, definition: ToolDefinition, handler: Arc<dyn ToolHandler>) {
        self.entries.push((definition, handler));
    }

    /// Names of the bundled tools, in order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(d, _)| d.name()).collect()
    }

    /// Register every bundled tool. Fails fast on the first registration
    /// error (a startup programming error).
    pub fn register_into(self, registry: &mut ToolRegistry) -> Result<(), ToolError> {
        for (definition, handler) in self.entries {
            let name = definition.name().to_string();
            registry.register(&name, handler, definition)?;
        }
        Ok(())
    }
}

// ─── Argument helpers shared by the capability handlers ───

/// A required string argument. Missing or non-string values are handler
/// failures; the registry already enforced required-presence for declared
/// parameters, so this mostly guards type confusion.
pub(crate) fn required_str(args: &ArgMap, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or_else(|| {
            ToolError::HandlerFailure(format!("argument '{key}' must be a string"))
        })
}

pub(crate) fn optional_str(args: &ArgMap, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(str::to_owned)
}

pub(crate) fn optional_u64(args: &ArgMap, key: &str) -> Option<u64> {
    args.get(key).and_then(|v| v.as_u64())
}

pub(crate) fn optional_bool(args: &ArgMap, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, serde_json::Value)]) -> ArgMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn required_str_accepts_strings_only() {
        let map = args(&[
            ("name", serde_json::json!("report.txt")),
            ("count", serde_json::json!(3)),
        ]);
        assert_eq!(required_str(&map, "name").unwrap(), "report.txt");
        assert!(required_str(&map, "count").is_err());
        assert!(required_str(&map, "absent").is_err());
    }

    #[test]
    fn optional_helpers_tolerate_absence() {
        let map = args(&[("loud", serde_json::json!(true))]);
        assert_eq!(optional_bool(&map, "loud"), Some(true));
        assert_eq!(optional_bool(&map, "missing"), None);
        assert_eq!(optional_u64(&map, "missing"), None);
        assert_eq!(optional_str(&map, "missing"), None);
    }

    #[test]
    fn capability_error_converts_to_handler_failure() {
        let err: ToolError = CapabilityError::NotFound("printer 'attic'".to_string()).into();
        assert!(matches!(err, ToolError::HandlerFailure(_)));
        assert!(err.to_string().contains("not found: printer 'attic'"));
    }
}
