//! Live session transport abstraction.
//!
//! The session loop talks to the realtime model through three traits:
//! [`LiveConnector`] opens a connection and hands back a send half and a
//! receive half. Splitting the duplex stream lets the loop poll
//! [`LiveReceiver::next_event`] in `select!` while other arms still send.
//!
//! The concrete transport (websocket client for the hosted realtime API)
//! lives behind these seams; tests script a fake connector.

use async_trait::async_trait;

use crate::error::Result;
use crate::tools::{ToolCall, ToolDefinition, ToolResponse};

/// Input flowing from the local environment up to the model.
#[derive(Debug, Clone)]
pub enum RealtimeInput {
    /// A chunk of microphone audio, 16-bit little-endian PCM.
    AudioChunk { pcm: Vec<u8> },
    /// A camera or screen frame, JPEG-encoded.
    VideoFrame { jpeg: Vec<u8> },
    /// Typed text, optionally closing the user's turn.
    Text { text: String, end_of_turn: bool },
}

/// Event flowing from the model down to the local environment.
#[derive(Debug)]
pub enum ServerEvent {
    /// Model speech audio for playback.
    Audio(Vec<u8>),
    /// A transcription fragment.
    Transcription { text: String, is_user: bool },
    /// One turn's batch of tool invocations. All calls in the batch are
    /// answered together in a single response message.
    ToolCalls(Vec<ToolCall>),
    /// The model finished its turn.
    TurnComplete,
    /// The server closed the session cleanly.
    Closed,
}

/// Sending half of a live session.
#[async_trait]
pub trait LiveSender: Send {
    /// Forward local input to the model.
    async fn send_input(&mut self, input: RealtimeInput) -> Result<()>;

    /// Send one turn's batch of tool responses.
    async fn send_tool_responses(&mut self, responses: Vec<ToolResponse>) -> Result<()>;
}

/// Receiving half of a live session.
#[async_trait]
pub trait LiveReceiver: Send {
    /// Await the next server event. `Ok(None)` means the stream ended
    /// without a close frame (network drop).
    async fn next_event(&mut self) -> Result<Option<ServerEvent>>;
}

/// Opens live sessions. The tool definitions are advertised on every
/// connect, so a reconnect always exports the current capability surface.
#[async_trait]
pub trait LiveConnector: Send + Sync {
    async fn connect(
        &self,
        tools: &[ToolDefinition],
    ) -> Result<(Box<dyn LiveSender>, Box<dyn LiveReceiver>)>;
}
