//! The live session loop.
//!
//! [`SessionLoop::run`] owns one connection at a time: it connects through
//! the [`LiveConnector`], pumps local input up and server events down, and
//! reconnects with exponential backoff when the link drops. Tool batches
//! are dispatched on a separate task so a pending confirmation never stalls
//! the audio path; each turn's responses are sent back as one batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::error::{AssistantError, Result};
use crate::permissions::SharedPermissionPolicy;
use crate::runtime::RuntimeEvent;
use crate::tools::{ConfirmationBroker, ConfirmationRequest, ToolRegistry, ToolResponse};

use super::live::{LiveConnector, LiveReceiver, LiveSender, RealtimeInput, ServerEvent};

const INPUT_CHANNEL_CAPACITY: usize = 256;
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Control handle for a running [`SessionLoop`].
///
/// Cheap to clone; all clones steer the same session.
#[derive(Clone)]
pub struct SessionHandle {
    input_tx: mpsc::Sender<RealtimeInput>,
    events: broadcast::Sender<RuntimeEvent>,
    paused: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Forward local input (mic audio, video frames, typed text).
    pub async fn send_input(&self, input: RealtimeInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| AssistantError::Channel("session input channel closed".to_string()))
    }

    /// Subscribe to the runtime event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.events.subscribe()
    }

    /// The event sender, for wiring auxiliary publishers (e.g.
    /// [`forward_confirmation_requests`]) into the same stream.
    pub fn event_sender(&self) -> broadcast::Sender<RuntimeEvent> {
        self.events.clone()
    }

    /// Pause or resume media forwarding. While paused, audio and video
    /// input is dropped at the loop; text still goes through.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
        tracing::info!(paused, "session pause state changed");
    }

    /// Whether media forwarding is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Stop the session loop. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

enum PumpEnd {
    /// Stopped deliberately; do not reconnect.
    Stopped,
    /// The link dropped; reconnect if configured.
    Dropped,
}

/// Drives one assistant session end to end.
pub struct SessionLoop {
    connector: Arc<dyn LiveConnector>,
    registry: Arc<ToolRegistry>,
    policy: SharedPermissionPolicy,
    broker: Option<Arc<ConfirmationBroker>>,
    events: broadcast::Sender<RuntimeEvent>,
    input_rx: mpsc::Receiver<RealtimeInput>,
    paused: Arc<AtomicBool>,
    cancel: CancellationToken,
    config: SessionConfig,
}

impl SessionLoop {
    /// Build a session loop and its control handle.
    ///
    /// `broker: None` runs headless — every confirmation-gated tool call
    /// is automatically denied.
    pub fn new(
        connector: Arc<dyn LiveConnector>,
        registry: Arc<ToolRegistry>,
        policy: SharedPermissionPolicy,
        broker: Option<Arc<ConfirmationBroker>>,
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let paused = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        let handle = SessionHandle {
            input_tx,
            events: events.clone(),
            paused: Arc::clone(&paused),
            cancel: cancel.clone(),
        };
        let session = Self {
            connector,
            registry,
            policy,
            broker,
            events,
            input_rx,
            paused,
            cancel,
            config,
        };
        (session, handle)
    }

    /// Run until stopped. Reconnects with exponential backoff on drops
    /// when `session.reconnect` is enabled; on exit, abandons any
    /// confirmation still waiting on the user.
    pub async fn run(mut self) -> Result<()> {
        let mut backoff = self.config.initial_backoff();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.connector.connect(self.registry.definitions()).await {
                Ok((sender, receiver)) => {
                    tracing::info!(tools = self.registry.len(), "live session connected");
                    let _ = self.events.send(RuntimeEvent::Connected);
                    backoff = self.config.initial_backoff();

                    match self.pump(sender, receiver).await {
                        PumpEnd::Stopped => break,
                        PumpEnd::Dropped => {
                            let will_retry =
                                self.config.reconnect && !self.cancel.is_cancelled();
                            tracing::warn!(will_retry, "live session dropped");
                            let _ = self.events.send(RuntimeEvent::Disconnected { will_retry });
                        }
                    }
                }
                Err(err) => {
                    let will_retry = self.config.reconnect && !self.cancel.is_cancelled();
                    tracing::warn!(error = %err, will_retry, "live session connect failed");
                    let _ = self.events.send(RuntimeEvent::Disconnected { will_retry });
                }
            }

            if !self.config.reconnect || self.cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(self.config.max_backoff());
        }

        if let Some(broker) = &self.broker {
            broker.abandon_all();
        }
        tracing::info!("session loop stopped");
        Ok(())
    }

    /// Pump one connection until it drops or the session is stopped.
    async fn pump(
        &mut self,
        mut sender: Box<dyn LiveSender>,
        mut receiver: Box<dyn LiveReceiver>,
    ) -> PumpEnd {
        // Dispatch tasks deliver each turn's batch of responses here.
        let (response_tx, mut response_rx) = mpsc::channel::<Vec<ToolResponse>>(8);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return PumpEnd::Stopped,

                input = self.input_rx.recv() => match input {
                    Some(input) => {
                        if self.paused.load(Ordering::Relaxed)
                            && matches!(
                                input,
                                RealtimeInput::AudioChunk { .. } | RealtimeInput::VideoFrame { .. }
                            )
                        {
                            continue;
                        }
                        if let Err(err) = sender.send_input(input).await {
                            tracing::warn!(error = %err, "failed to forward input");
                            return PumpEnd::Dropped;
                        }
                    }
                    // Every handle is gone; nothing can feed this session.
                    None => return PumpEnd::Stopped,
                },

                Some(batch) = response_rx.recv() => {
                    if let Err(err) = sender.send_tool_responses(batch).await {
                        tracing::warn!(error = %err, "failed to send tool responses");
                        return PumpEnd::Dropped;
                    }
                }

                event = receiver.next_event() => match event {
                    Ok(Some(ServerEvent::Audio(pcm))) => {
                        let _ = self.events.send(RuntimeEvent::Audio { pcm });
                    }
                    Ok(Some(ServerEvent::Transcription { text, is_user })) => {
                        let _ = self.events.send(RuntimeEvent::Transcription { text, is_user });
                    }
                    Ok(Some(ServerEvent::ToolCalls(calls))) => {
                        self.spawn_dispatch(calls, response_tx.clone());
                    }
                    Ok(Some(ServerEvent::TurnComplete)) => {}
                    Ok(Some(ServerEvent::Closed)) | Ok(None) => {
                        return PumpEnd::Dropped;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "live receive error");
                        return PumpEnd::Dropped;
                    }
                },
            }
        }
    }

    /// Dispatch one turn's batch of tool calls on a task of its own.
    ///
    /// Calls within the batch run concurrently; the batch is sent back as
    /// a single response message once every call has settled. The pump
    /// keeps streaming audio in the meantime.
    fn spawn_dispatch(
        &self,
        calls: Vec<crate::tools::ToolCall>,
        response_tx: mpsc::Sender<Vec<ToolResponse>>,
    ) {
        let registry = Arc::clone(&self.registry);
        let policy = Arc::clone(&self.policy);
        let broker = self.broker.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            for call in &calls {
                let _ = events.send(RuntimeEvent::ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    args_json: serde_json::Value::Object(call.args.clone()).to_string(),
                });
            }

            let dispatches = calls
                .into_iter()
                .map(|call| registry.dispatch(call, &policy, broker.as_deref()));
            let responses = futures_util::future::join_all(dispatches).await;

            for response in &responses {
                let _ = events.send(RuntimeEvent::ToolResult {
                    id: response.id.clone(),
                    name: response.name.clone(),
                    result: response.response.to_string(),
                });
            }

            // The pump may already be gone after a drop; that's fine, the
            // batch dies with the connection it belonged to.
            if response_tx.send(responses).await.is_err() {
                tracing::debug!("tool responses dropped; session pump is gone");
            }
        });
    }
}

/// Forward confirmation requests from the broker's channel into the
/// runtime event stream, for frontends that render approval prompts from
/// the same subscription they render everything else.
pub fn forward_confirmation_requests(
    mut request_rx: mpsc::UnboundedReceiver<ConfirmationRequest>,
    events: broadcast::Sender<RuntimeEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            let _ = events.send(RuntimeEvent::ConfirmationRequested {
                request_id: request.id,
                tool: request.tool,
                args_json: serde_json::Value::Object(request.args).to_string(),
            });
        }
    })
}
