//! Error types for the assistant runtime.

/// Top-level error type for the voice assistant runtime.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Duplex session transport error (connect, send, receive).
    #[error("session error: {0}")]
    Session(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// Tool registration or dispatch error.
    #[error(transparent)]
    Tool(#[from] crate::tools::ToolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
