//! Tool registry with confirmation-gated dispatch.
//!
//! The [`ToolRegistry`] is the single source of truth for what tools exist
//! and how to run one. It owns the mapping {tool name → (handler,
//! definition)}, exports the combined definition list for advertising to
//! the model, and dispatches calls: policy check, optional confirmation
//! handshake, argument filtering, handler execution, and response wrapping.
//!
//! `dispatch` never fails: every failure path resolves to a structured
//! [`ToolResponse`], so the session loop can always send back exactly one
//! response per call it received.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use crate::permissions::SharedPermissionPolicy;

use super::confirm::{ConfirmationBroker, ConfirmationOutcome};
use super::error::ToolError;
use super::types::{ArgMap, ToolCall, ToolDefinition, ToolHandler, ToolResponse};

/// Registry of callable tools.
///
/// Registration happens at startup, before the dispatch loop accepts calls;
/// afterwards the registry is shared immutably (`Arc<ToolRegistry>`).
/// Registration order is a visible contract: definitions are exported to
/// the model in exactly the order they were registered.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under `name`.
    ///
    /// # Errors
    ///
    /// - [`ToolError::SchemaMismatch`] when `name` differs from the
    ///   definition's name.
    /// - [`ToolError::DuplicateRegistration`] when `name` is already
    ///   registered. Re-registering is a startup programming error, not a
    ///   runtime condition — fail fast rather than silently shadowing.
    pub fn register(
        &mut self,
        name: &str,
        handler: Arc<dyn ToolHandler>,
        definition: ToolDefinition,
    ) -> Result<(), ToolError> {
        if name != definition.name() {
            return Err(ToolError::SchemaMismatch(format!(
                "tool name mismatch: registered as '{name}' but definition says '{}'",
                definition.name()
            )));
        }
        if self.handlers.contains_key(name) {
            return Err(ToolError::DuplicateRegistration(format!(
                "tool '{name}' is already registered"
            )));
        }

        self.handlers.insert(name.to_string(), handler);
        self.definitions.push(definition);
        tracing::info!(tool = name, "registered tool");
        Ok(())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// All definitions, in registration order. Pure; safe to call on every
    /// reconnect since the capability surface may have grown between
    /// connections.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// JSON declarations for the capability export at session (re)connect.
    pub fn declarations(&self) -> Vec<serde_json::Value> {
        self.definitions.iter().map(|d| d.to_declaration()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Dispatch one tool call.
    ///
    /// The permission policy is read fresh on every call. When the policy
    /// gates the tool and a broker is present, this suspends only the
    /// calling future while the user decides; sibling calls and the audio
    /// pipeline continue unaffected. When the tool is gated but no broker
    /// exists (headless mode), the call is auto-denied — fail closed, never
    /// silently execute.
    ///
    /// Never returns an error: unknown tools, denials, schema problems,
    /// handler errors and handler panics all surface as structured
    /// responses paired to `call.id`.
    pub async fn dispatch(
        &self,
        call: ToolCall,
        policy: &SharedPermissionPolicy,
        broker: Option<&ConfirmationBroker>,
    ) -> ToolResponse {
        let ToolCall { id, name, args } = call;

        let Some(handler) = self.handlers.get(&name) else {
            tracing::warn!(tool = %name, call_id = %id, "unknown tool requested");
            let err = ToolError::UnknownTool(format!("unknown tool: {name}"));
            return ToolResponse::error(id, name, &err);
        };
        // register() keeps handlers and definitions in lockstep.
        let definition = self.definitions.iter().find(|d| d.name() == name);

        let requires_confirmation = policy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requires_confirmation(&name);

        if requires_confirmation {
            let Some(broker) = broker else {
                tracing::info!(tool = %name, call_id = %id, "no confirmation channel; auto-denying gated tool");
                return ToolResponse::denial(
                    id,
                    name,
                    "This tool requires user confirmation, but no confirmation channel \
                     is available, so the request was automatically denied.",
                );
            };

            match broker.confirm(&name, &args).await {
                ConfirmationOutcome::Approved => {}
                ConfirmationOutcome::Denied => {
                    tracing::info!(tool = %name, call_id = %id, "tool call denied by user");
                    return ToolResponse::denial(
                        id,
                        name,
                        "User denied the request to use this tool.",
                    );
                }
                ConfirmationOutcome::TimedOut => {
                    tracing::warn!(tool = %name, call_id = %id, "confirmation timed out");
                    return ToolResponse::denial(
                        id,
                        name,
                        "The confirmation request timed out before the user responded, \
                         so the tool was not run.",
                    );
                }
                ConfirmationOutcome::Abandoned => {
                    tracing::warn!(tool = %name, call_id = %id, "confirmation abandoned");
                    return ToolResponse::denial(
                        id,
                        name,
                        "The session ended before the user could confirm, \
                         so the tool was not run.",
                    );
                }
            }
        }

        let args = match definition {
            Some(def) => {
                let missing = def.missing_required(&args);
                if !missing.is_empty() {
                    let err = ToolError::SchemaMismatch(format!(
                        "tool '{name}' is missing required argument(s): {}",
                        missing.join(", ")
                    ));
                    tracing::warn!(tool = %name, call_id = %id, %err, "rejecting call");
                    return ToolResponse::error(id, name, &err);
                }
                // Schemas drift; drop unknown extras instead of failing hard.
                filter_args(args, def)
            }
            None => args,
        };

        tracing::info!(tool = %name, call_id = %id, "executing tool");

        // Run on a task of its own so a panicking handler is contained at
        // the dispatch boundary instead of unwinding through the session.
        let handler = Arc::clone(handler);
        let joined = tokio::spawn(async move { handler.call(args).await }).await;

        match joined {
            Ok(Ok(output)) => ToolResponse::from_output(id, name, output),
            Ok(Err(err)) => {
                tracing::error!(tool = %name, call_id = %id, %err, "tool execution failed");
                return ToolResponse::error(id, name, &err);
            }
            Err(join_err) => {
                tracing::error!(tool = %name, call_id = %id, error = %join_err, "tool execution panicked");
                let err = ToolError::HandlerFailure(format!(
                    "tool '{name}' execution panicked"
                ));
                ToolResponse::error(id, name, &err)
            }
        }
    }
}

/// Keep only arguments the definition declares.
fn filter_args(args: ArgMap, definition: &ToolDefinition) -> ArgMap {
    args.into_iter()
        .filter(|(key, _)| {
            let keep = definition.has_parameter(key);
            if !keep {
                tracing::debug!(tool = definition.name(), arg = %key, "dropping undeclared argument");
            }
            keep
        })
        .collect()
}
