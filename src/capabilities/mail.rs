//! Mail actions behind a [`Mailbox`] seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::tools::{ParameterKind, ToolDefinition, handler_fn};

use super::{CapabilityBundle, CapabilityError, optional_u64, required_str};

const DEFAULT_LIST_LIMIT: usize = 5;

/// A received message, reduced to what gets spoken.
#[derive(Debug, Clone)]
pub struct EmailSummary {
    pub from: String,
    pub subject: String,
}

/// Mail backend seam.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Send a plain-text email.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), CapabilityError>;

    /// Most recent inbox messages, newest first, at most `max`.
    async fn list_emails(&self, max: usize) -> Result<Vec<EmailSummary>, CapabilityError>;
}

fn format_inbox(emails: &[EmailSummary]) -> String {
    if emails.is_empty() {
        return "The inbox has no recent messages.".to_string();
    }
    let lines: Vec<String> = emails
        .iter()
        .map(|e| format!("'{}' from {}", e.subject, e.from))
        .collect();
    format!(
        "The {} most recent message(s): {}",
        emails.len(),
        lines.join("; ")
    )
}

/// Bundle the mail tools over `mailbox`.
pub fn bundle(mailbox: Arc<dyn Mailbox>) -> CapabilityBundle {
    let mut bundle = CapabilityBundle::new();

    let mb = Arc::clone(&mailbox);
    bundle.push(
        ToolDefinition::new("mail_send_email", "Send an email on the user's behalf.")
            .required_param("to", ParameterKind::String, "Recipient address")
            .required_param("subject", ParameterKind::String, "Subject line")
            .required_param("body", ParameterKind::String, "Plain-text message body"),
        handler_fn(move |args| {
            let mb = Arc::clone(&mb);
            async move {
                let to = required_str(&args, "to")?;
                if !to.contains('@') {
                    return Err(CapabilityError::InvalidInput(format!(
                        "not a valid email address: {to}"
                    ))
                    .into());
                }
                let subject = required_str(&args, "subject")?;
                let body = required_str(&args, "body")?;
                mb.send_email(&to, &subject, &body).await?;
                Ok(serde_json::json!({
                    "result": format!("Sent '{subject}' to {to}.")
                }))
            }
        }),
    );

    let mb = Arc::clone(&mailbox);
    bundle.push(
        ToolDefinition::new(
            "mail_list_emails",
            "Summarize the most recent inbox messages.",
        )
        .optional_param(
            "max_results",
            ParameterKind::Integer,
            "Maximum number of messages to summarize; defaults to 5",
        ),
        handler_fn(move |args| {
            let mb = Arc::clone(&mb);
            async move {
                let max = optional_u64(&args, "max_results")
                    .map(|n| n as usize)
                    .unwrap_or(DEFAULT_LIST_LIMIT);
                let emails = mb.list_emails(max).await?;
                Ok(serde_json::json!({ "result": format_inbox(&emails) }))
            }
        }),
    );

    bundle
}
