//! Tool dispatch: registry, confirmation broker, and the shared types
//! that flow between the live session and the bound capability handlers.

pub mod confirm;
pub mod error;
pub mod registry;
pub mod types;

pub use confirm::{ConfirmationBroker, ConfirmationOutcome, ConfirmationRequest};
pub use error::{ToolError, error_codes};
pub use registry::ToolRegistry;
pub use types::{
    ArgMap, ParameterKind, ParameterSpec, ToolCall, ToolDefinition, ToolHandler, ToolResponse,
    handler_fn,
};
