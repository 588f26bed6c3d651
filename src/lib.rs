//! aria — a voice-driven personal assistant runtime.
//!
//! A duplex session streams the user's audio to a realtime speech model
//! and plays the model's speech back; when the model asks to act on the
//! world, the request flows through a [`ToolRegistry`] that enforces a
//! per-tool confirmation policy before any handler runs. Capabilities
//! (files, calendar, mail, printing, messaging, smart lights, webhooks)
//! plug in behind async trait seams and register explicit
//! `(name, handler, definition)` triples.
//!
//! The short version of the safety contract:
//!
//! - every tool requires confirmation unless the policy says otherwise,
//! - with no confirmation channel wired, gated tools are denied,
//! - denials are spoken outcomes, not errors,
//! - a misbehaving handler fails its own call and nothing else.

pub mod capabilities;
pub mod config;
pub mod error;
pub mod permissions;
pub mod runtime;
pub mod session;
pub mod tools;

pub use config::{AssistantConfig, ConfirmationConfig, SessionConfig};
pub use error::{AssistantError, Result};
pub use permissions::{PermissionPolicy, SharedPermissionPolicy};
pub use runtime::RuntimeEvent;
pub use session::{
    LiveConnector, LiveReceiver, LiveSender, RealtimeInput, ServerEvent, SessionHandle,
    SessionLoop, forward_confirmation_requests,
};
pub use tools::{
    ConfirmationBroker, ConfirmationOutcome, ConfirmationRequest, ToolCall, ToolDefinition,
    ToolError, ToolRegistry, ToolResponse,
};

/// Install the global tracing subscriber, honoring `RUST_LOG`.
///
/// Call once at startup; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
