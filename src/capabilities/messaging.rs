//! Chat-message actions behind a [`Messenger`] seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::tools::{ParameterKind, ToolDefinition, handler_fn};

use super::{CapabilityBundle, CapabilityError, required_str};

/// Whether the messaging bridge is signed in and reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessengerStatus {
    Connected,
    Disconnected,
}

/// Messaging backend seam.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send `message` to the contact or group named `to`.
    async fn send_message(&self, to: &str, message: &str) -> Result<(), CapabilityError>;

    /// Current bridge status.
    async fn connection_status(&self) -> Result<MessengerStatus, CapabilityError>;
}

/// Bundle the messaging tools over `messenger`.
pub fn bundle(messenger: Arc<dyn Messenger>) -> CapabilityBundle {
    let mut bundle = CapabilityBundle::new();

    let msgr = Arc::clone(&messenger);
    bundle.push(
        ToolDefinition::new(
            "chat_send_message",
            "Send a chat message to a contact or group.",
        )
        .required_param("to", ParameterKind::String, "Contact or group name")
        .required_param("message", ParameterKind::String, "Message text"),
        handler_fn(move |args| {
            let msgr = Arc::clone(&msgr);
            async move {
                let to = required_str(&args, "to")?;
                let message = required_str(&args, "message")?;
                msgr.send_message(&to, &message).await?;
                Ok(serde_json::json!({
                    "result": format!("Message sent to {to}.")
                }))
            }
        }),
    );

    let msgr = Arc::clone(&messenger);
    bundle.push(
        ToolDefinition::new(
            "chat_connection_status",
            "Check whether the messaging bridge is connected.",
        ),
        handler_fn(move |_args| {
            let msgr = Arc::clone(&msgr);
            async move {
                let status = msgr.connection_status().await?;
                let spoken = match status {
                    MessengerStatus::Connected => "The messaging bridge is connected.",
                    MessengerStatus::Disconnected => {
                        "The messaging bridge is not connected; messages cannot be sent."
                    }
                };
                Ok(serde_json::json!({ "result": spoken }))
            }
        }),
    );

    bundle
}
