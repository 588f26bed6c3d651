//! Runtime event stream.
//!
//! [`RuntimeEvent`] is the broadcast fan-out that frontends subscribe to:
//! audio for playback, transcriptions for display, tool activity and
//! confirmation prompts for the approval UI, and connection state for
//! status indicators. Events are best-effort; a slow subscriber lags and
//! drops, it never backpressures the session loop.

use uuid::Uuid;

/// An observable event emitted by the running assistant session.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Model audio output, 16-bit little-endian PCM.
    Audio { pcm: Vec<u8> },
    /// A transcription fragment of model or user speech.
    Transcription { text: String, is_user: bool },
    /// The model requested a tool invocation.
    ToolCall {
        id: String,
        name: String,
        args_json: String,
    },
    /// A tool invocation settled (result, denial, or error).
    ToolResult {
        id: String,
        name: String,
        result: String,
    },
    /// A gated tool is waiting on user confirmation.
    ConfirmationRequested {
        request_id: Uuid,
        tool: String,
        args_json: String,
    },
    /// The live session (re)connected.
    Connected,
    /// The live session dropped. `will_retry` says whether the loop is
    /// about to reconnect or has given up.
    Disconnected { will_retry: bool },
}
