//! End-to-end dispatch scenarios: plain execution, confirmation denial,
//! unknown tools, failing handlers, and concurrent gated calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use aria::tools::{
    ArgMap, ConfirmationBroker, ConfirmationRequest, ParameterKind, ToolCall, ToolDefinition,
    ToolError, ToolRegistry, handler_fn,
};
use aria::{PermissionPolicy, SharedPermissionPolicy};

fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    let args = match args {
        serde_json::Value::Object(map) => map,
        _ => ArgMap::new(),
    };
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        args,
    }
}

fn echo_registry(counter: Arc<AtomicUsize>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(
            "echo",
            handler_fn(move |args: ArgMap| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let text = args
                        .get("text")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    Ok(serde_json::json!({ "result": text }))
                }
            }),
            ToolDefinition::new("echo", "Echo a message back.").required_param(
                "text",
                ParameterKind::String,
                "Message to echo",
            ),
        )
        .expect("register echo");
    registry
}

fn broker_pair() -> (
    Arc<ConfirmationBroker>,
    mpsc::UnboundedReceiver<ConfirmationRequest>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Arc::new(ConfirmationBroker::new(
            tx,
            ConfirmationBroker::DEFAULT_TIMEOUT,
        )),
        rx,
    )
}

/// Auto-resolver: answers every confirmation request with `decision`.
fn auto_resolve(
    broker: Arc<ConfirmationBroker>,
    mut rx: mpsc::UnboundedReceiver<ConfirmationRequest>,
    decision: bool,
) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        let mut resolved = 0;
        while let Some(request) = rx.recv().await {
            broker.resolve(request.id, decision);
            resolved += 1;
        }
        resolved
    })
}

// Scenario A: allowed tool executes and echoes.
#[tokio::test]
async fn allowed_tool_round_trip() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = echo_registry(Arc::clone(&counter));
    let policy: SharedPermissionPolicy = {
        let mut p = PermissionPolicy::default();
        p.allow_unconfirmed("echo");
        p.into_shared()
    };

    let response = registry
        .dispatch(
            call("a-1", "echo", serde_json::json!({ "text": "hello there" })),
            &policy,
            None,
        )
        .await;

    assert_eq!(response.id, "a-1");
    assert_eq!(response.name, "echo");
    assert_eq!(response.result_text(), Some("hello there"));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

// Scenario B: gated tool, user denies, handler never runs.
#[tokio::test]
async fn denied_tool_is_side_effect_free() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = echo_registry(Arc::clone(&counter));
    let policy = PermissionPolicy::default_shared();
    let (broker, rx) = broker_pair();
    let _resolver = auto_resolve(Arc::clone(&broker), rx, false);

    let response = registry
        .dispatch(
            call("b-1", "echo", serde_json::json!({ "text": "secret" })),
            &policy,
            Some(&broker),
        )
        .await;

    assert_eq!(
        response.result_text(),
        Some("User denied the request to use this tool.")
    );
    assert!(response.error_text().is_none(), "denial is not an error");
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert_eq!(broker.pending_count(), 0);
}

// Scenario C: unknown tool name resolves to an error response.
#[tokio::test]
async fn unknown_tool_resolves_not_raises() {
    let registry = ToolRegistry::new();
    let policy = PermissionPolicy::default_shared();

    let response = registry
        .dispatch(call("c-1", "teleport", serde_json::json!({})), &policy, None)
        .await;

    assert_eq!(response.id, "c-1");
    let error = response.error_text().expect("error response");
    assert!(error.contains("UNKNOWN_TOOL"));
    assert!(error.contains("teleport"));
}

// Scenario D: a failing handler becomes an error response, approved or not.
#[tokio::test]
async fn failing_handler_resolves_to_error_response() {
    let mut registry = ToolRegistry::new();
    registry
        .register(
            "flaky",
            handler_fn(|_args: ArgMap| async {
                Err(ToolError::HandlerFailure("backend unreachable".to_string()))
            }),
            ToolDefinition::new("flaky", "Always fails."),
        )
        .expect("register flaky");
    let policy = PermissionPolicy::default_shared();
    let (broker, rx) = broker_pair();
    let _resolver = auto_resolve(Arc::clone(&broker), rx, true);

    let response = registry
        .dispatch(
            call("d-1", "flaky", serde_json::json!({})),
            &policy,
            Some(&broker),
        )
        .await;

    let error = response.error_text().expect("error response");
    assert!(error.contains("backend unreachable"));
    assert_eq!(broker.pending_count(), 0);
}

// Absent policy entries are confirm-by-default, and headless means deny.
#[tokio::test]
async fn unlisted_tool_defaults_to_confirmation() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = echo_registry(Arc::clone(&counter));
    let policy = PermissionPolicy::default_shared();

    let response = registry
        .dispatch(
            call("e-1", "echo", serde_json::json!({ "text": "hi" })),
            &policy,
            None,
        )
        .await;

    let result = response.result_text().expect("denial result");
    assert!(result.contains("automatically denied"));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

// Two gated calls in flight at once resolve independently.
#[tokio::test]
async fn concurrent_confirmations_resolve_independently() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(echo_registry(Arc::clone(&counter)));
    let policy = PermissionPolicy::default_shared();
    let (broker, mut rx) = broker_pair();

    let first = {
        let registry = Arc::clone(&registry);
        let policy = Arc::clone(&policy);
        let broker = Arc::clone(&broker);
        tokio::spawn(async move {
            registry
                .dispatch(
                    call("f-1", "echo", serde_json::json!({ "text": "first" })),
                    &policy,
                    Some(&broker),
                )
                .await
        })
    };
    let second = {
        let registry = Arc::clone(&registry);
        let policy = Arc::clone(&policy);
        let broker = Arc::clone(&broker);
        tokio::spawn(async move {
            registry
                .dispatch(
                    call("f-2", "echo", serde_json::json!({ "text": "second" })),
                    &policy,
                    Some(&broker),
                )
                .await
        })
    };

    let req_a = rx.recv().await.expect("first request");
    let req_b = rx.recv().await.expect("second request");
    assert_ne!(req_a.id, req_b.id);

    // Approve one, deny the other, in reverse arrival order.
    broker.resolve(req_b.id, false);
    broker.resolve(req_a.id, true);

    let responses = [first.await.unwrap(), second.await.unwrap()];
    let approved: Vec<_> = responses
        .iter()
        .filter(|r| r.result_text().is_some_and(|t| !t.contains("denied")))
        .collect();
    let denied: Vec<_> = responses
        .iter()
        .filter(|r| r.result_text().is_some_and(|t| t.contains("denied")))
        .collect();
    assert_eq!(approved.len(), 1);
    assert_eq!(denied.len(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(broker.pending_count(), 0, "pending map never leaks");
}

// A slow decision holds up only its own call.
#[tokio::test]
async fn pending_confirmation_does_not_block_other_tools() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(echo_registry(Arc::clone(&counter)));
    let policy: SharedPermissionPolicy = PermissionPolicy::default_shared();
    let (broker, mut rx) = broker_pair();

    // Gated call parks on the broker.
    let gated = {
        let registry = Arc::clone(&registry);
        let policy = Arc::clone(&policy);
        let broker = Arc::clone(&broker);
        tokio::spawn(async move {
            registry
                .dispatch(
                    call("g-1", "echo", serde_json::json!({ "text": "later" })),
                    &policy,
                    Some(&broker),
                )
                .await
        })
    };
    let request = rx.recv().await.expect("request published");

    // While it waits, an allowed call sails through.
    policy.lock().expect("policy lock").allow_unconfirmed("echo");
    let quick = registry
        .dispatch(
            call("g-2", "echo", serde_json::json!({ "text": "now" })),
            &policy,
            Some(&broker),
        )
        .await;
    assert_eq!(quick.result_text(), Some("now"));

    broker.resolve(request.id, true);
    let parked = tokio::time::timeout(Duration::from_secs(1), gated)
        .await
        .expect("gated call settles")
        .unwrap();
    assert_eq!(parked.result_text(), Some("later"));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}
