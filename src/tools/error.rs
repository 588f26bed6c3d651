//! Error types for the tool dispatch system.
//!
//! Each error variant carries a stable error code (SCREAMING_SNAKE_CASE)
//! that is included in the Display output and accessible via [`ToolError::code()`].
//! Codes are part of the public API contract and will not change.

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Tool name is not registered.
    pub const UNKNOWN_TOOL: &str = "UNKNOWN_TOOL";

    /// Definition/name mismatch at registration, or missing required arguments.
    pub const SCHEMA_MISMATCH: &str = "SCHEMA_MISMATCH";

    /// A tool with this name is already registered.
    pub const DUPLICATE_TOOL: &str = "DUPLICATE_TOOL";

    /// The bound handler returned an error or panicked.
    pub const HANDLER_FAILED: &str = "HANDLER_FAILED";
}

/// Errors produced by tool registration and dispatch.
///
/// Registration-time variants ([`SchemaMismatch`](Self::SchemaMismatch),
/// [`DuplicateRegistration`](Self::DuplicateRegistration)) indicate a
/// programming error and should stop startup. All per-call variants are
/// recovered inside dispatch and surfaced to the model as structured
/// result strings; they never propagate out of the registry.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The requested tool name is not registered.
    #[error("[{}] {}", error_codes::UNKNOWN_TOOL, .0)]
    UnknownTool(String),

    /// Registration name does not match the definition, or a call is
    /// missing required arguments.
    #[error("[{}] {}", error_codes::SCHEMA_MISMATCH, .0)]
    SchemaMismatch(String),

    /// A tool with this name is already registered.
    #[error("[{}] {}", error_codes::DUPLICATE_TOOL, .0)]
    DuplicateRegistration(String),

    /// The bound handler returned an error or panicked.
    #[error("[{}] {}", error_codes::HANDLER_FAILED, .0)]
    HandlerFailure(String),
}

impl ToolError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => error_codes::UNKNOWN_TOOL,
            Self::SchemaMismatch(_) => error_codes::SCHEMA_MISMATCH,
            Self::DuplicateRegistration(_) => error_codes::DUPLICATE_TOOL,
            Self::HandlerFailure(_) => error_codes::HANDLER_FAILED,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::UnknownTool(m)
            | Self::SchemaMismatch(m)
            | Self::DuplicateRegistration(m)
            | Self::HandlerFailure(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = ToolError::UnknownTool("no tool named 'nope'".to_string());
        let rendered = err.to_string();
        assert!(rendered.contains("UNKNOWN_TOOL"));
        assert!(rendered.contains("nope"));
    }

    #[test]
    fn code_is_stable_per_variant() {
        assert_eq!(ToolError::UnknownTool(String::new()).code(), "UNKNOWN_TOOL");
        assert_eq!(
            ToolError::SchemaMismatch(String::new()).code(),
            "SCHEMA_MISMATCH"
        );
        assert_eq!(
            ToolError::DuplicateRegistration(String::new()).code(),
            "DUPLICATE_TOOL"
        );
        assert_eq!(
            ToolError::HandlerFailure(String::new()).code(),
            "HANDLER_FAILED"
        );
    }

    #[test]
    fn message_strips_code_prefix() {
        let err = ToolError::HandlerFailure("printer offline".to_string());
        assert_eq!(err.message(), "printer offline");
        assert!(err.to_string().starts_with("[HANDLER_FAILED]"));
    }
}
