//! Confirmation broker bridging a dispatch awaiting approval and the
//! out-of-band resolver (a UI event handler, typically on another task).
//!
//! Each gated call registers a oneshot slot keyed by a fresh request id,
//! publishes a [`ConfirmationRequest`] to the external sink, and suspends
//! only its own future until [`ConfirmationBroker::resolve`] delivers the
//! user's decision. Pending entries are removed on every exit path —
//! approval, denial, timeout, and session teardown.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::types::ArgMap;

/// A request for the external actor to approve or deny a tool execution.
#[derive(Debug, Clone)]
pub struct ConfirmationRequest {
    /// Fresh request id; never reused.
    pub id: Uuid,
    /// The tool the model wants to run.
    pub tool: String,
    /// The arguments the model supplied.
    pub args: ArgMap,
}

/// Outcome of one confirmation handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The user approved the call.
    Approved,
    /// The user declined the call.
    Denied,
    /// No decision arrived within the broker's timeout.
    TimedOut,
    /// The session ended (or the request sink vanished) while waiting.
    Abandoned,
}

impl ConfirmationOutcome {
    /// Whether the handler may execute. Everything except `Approved` is
    /// treated as denial.
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Bridges "ask the user, then wait" across two independent event sources:
/// the dispatch coroutine waiting and the UI resolving at an arbitrary
/// later time, possibly from a different task.
pub struct ConfirmationBroker {
    pending: Mutex<HashMap<Uuid, oneshot::Sender<bool>>>,
    request_tx: mpsc::UnboundedSender<ConfirmationRequest>,
    timeout: Duration,
}

impl ConfirmationBroker {
    /// Default decision timeout, matching `ConfirmationConfig`'s default.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a broker publishing requests to `request_tx`. Waits longer
    /// than `timeout` resolve to [`ConfirmationOutcome::TimedOut`];
    /// deployments thread `ConfirmationConfig::timeout()` through here.
    pub fn new(request_tx: mpsc::UnboundedSender<ConfirmationRequest>, timeout: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            request_tx,
            timeout,
        }
    }

    /// Ask the external actor to approve running `tool` with `args` and
    /// suspend this call (only this call) until resolution.
    ///
    /// Publishing is fire-and-forget; the wait is bounded by the broker's
    /// timeout. On return the pending entry for this request is gone,
    /// whatever the outcome.
    pub async fn confirm(&self, tool: &str, args: &ArgMap) -> ConfirmationOutcome {
        let id = Uuid::new_v4();
        let (decision_tx, decision_rx) = oneshot::channel::<bool>();
        self.pending_map().insert(id, decision_tx);

        let request = ConfirmationRequest {
            id,
            tool: tool.to_string(),
            args: args.clone(),
        };
        if self.request_tx.send(request).is_err() {
            tracing::warn!(tool, "confirmation sink is gone; treating as denial");
            self.pending_map().remove(&id);
            return ConfirmationOutcome::Abandoned;
        }

        tracing::info!(tool, request_id = %id, "awaiting user confirmation");

        let outcome = match tokio::time::timeout(self.timeout, decision_rx).await {
            Ok(Ok(true)) => ConfirmationOutcome::Approved,
            Ok(Ok(false)) => ConfirmationOutcome::Denied,
            // Sender dropped without a decision: abandon_all or broker teardown.
            Ok(Err(_)) => ConfirmationOutcome::Abandoned,
            Err(_) => ConfirmationOutcome::TimedOut,
        };

        // resolve() removes the entry when it delivers a decision; the
        // timeout and abandon paths leave it behind, so sweep here.
        self.pending_map().remove(&id);

        tracing::info!(tool, request_id = %id, ?outcome, "confirmation settled");
        outcome
    }

    /// Deliver the user's decision for a pending request.
    ///
    /// Safe to call from any task. An unknown or already-resolved id is a
    /// logged no-op, never an error — the UI may race a timeout or send a
    /// duplicate click. Returns whether a waiter received the decision.
    pub fn resolve(&self, id: Uuid, confirmed: bool) -> bool {
        let Some(decision_tx) = self.pending_map().remove(&id) else {
            tracing::warn!(request_id = %id, "confirmation id unknown or already resolved");
            return false;
        };
        if decision_tx.send(confirmed).is_err() {
            tracing::warn!(request_id = %id, "confirmation waiter is gone");
            return false;
        }
        true
    }

    /// Abandon every pending confirmation. Each waiter resolves to denial
    /// rather than hanging; called on session teardown.
    pub fn abandon_all(&self) {
        let drained: Vec<Uuid> = {
            let mut pending = self.pending_map();
            let ids = pending.keys().copied().collect();
            // Dropping the senders wakes every waiter with Abandoned.
            pending.clear();
            ids
        };
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "abandoned pending confirmations");
        }
    }

    /// Number of confirmations currently awaiting a decision.
    pub fn pending_count(&self) -> usize {
        self.pending_map().len()
    }

    // Lock scoped to map mutation only, never held across an await.
    // A poisoned lock still guards valid data.
    fn pending_map(&self) -> MutexGuard<'_, HashMap<Uuid, oneshot::Sender<bool>>> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
