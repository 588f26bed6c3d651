//! Webhook triggers.
//!
//! [`HttpWebhookSender`] posts JSON payloads over reqwest;
//! [`WebhookDirectory`] holds named endpoints so the user can say "fire
//! the garage webhook" without dictating a URL.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::tools::{ParameterKind, ToolDefinition, handler_fn};

use super::{CapabilityBundle, CapabilityError, optional_str, required_str};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook transport seam.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// POST `payload` as JSON to `url`; returns the response status code.
    async fn send(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<u16, CapabilityError>;
}

/// Webhook transport over reqwest.
pub struct HttpWebhookSender {
    client: reqwest::Client,
}

impl HttpWebhookSender {
    pub fn new() -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CapabilityError::Backend(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<u16, CapabilityError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| CapabilityError::Backend(format!("webhook request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityError::Backend(format!(
                "webhook returned {status}"
            )));
        }
        Ok(status.as_u16())
    }
}

/// Named webhook endpoints, loaded from configuration at startup.
#[derive(Debug, Clone, Default)]
pub struct WebhookDirectory {
    endpoints: BTreeMap<String, String>,
}

impl WebhookDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.endpoints.insert(name.into(), url.into());
    }

    pub fn url_for(&self, name: &str) -> Option<&str> {
        self.endpoints.get(name).map(String::as_str)
    }

    pub fn names(&self) -> Vec<&str> {
        self.endpoints.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl From<BTreeMap<String, String>> for WebhookDirectory {
    fn from(endpoints: BTreeMap<String, String>) -> Self {
        Self { endpoints }
    }
}

/// Decode the optional `payload` argument. A JSON object passes through;
/// any other text becomes `{"message": <text>}`; absent means `{}`.
fn decode_payload(raw: Option<String>) -> serde_json::Value {
    match raw {
        None => serde_json::json!({}),
        Some(text) => match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            _ => serde_json::json!({ "message": text }),
        },
    }
}

fn require_http_url(url: &str) -> Result<(), CapabilityError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(CapabilityError::InvalidInput(format!(
            "not an http(s) URL: {url}"
        )))
    }
}

/// Bundle the webhook tools over `sender` and `directory`.
pub fn bundle(sender: Arc<dyn WebhookSender>, directory: Arc<WebhookDirectory>) -> CapabilityBundle {
    let mut bundle = CapabilityBundle::new();

    let tx = Arc::clone(&sender);
    bundle.push(
        ToolDefinition::new("webhook_send", "Trigger a webhook at a given URL.")
            .required_param("url", ParameterKind::String, "Target http(s) URL")
            .optional_param(
                "payload",
                ParameterKind::String,
                "JSON object to post, or plain text wrapped as {\"message\": ...}",
            ),
        handler_fn(move |args| {
            let tx = Arc::clone(&tx);
            async move {
                let url = required_str(&args, "url")?;
                require_http_url(&url)?;
                let payload = decode_payload(optional_str(&args, "payload"));
                let status = tx.send(&url, &payload).await?;
                Ok(serde_json::json!({
                    "result": format!("Webhook triggered; the server answered {status}.")
                }))
            }
        }),
    );

    let tx = Arc::clone(&sender);
    let dir = Arc::clone(&directory);
    bundle.push(
        ToolDefinition::new(
            "webhook_send_saved",
            "Trigger one of the user's saved webhooks by name.",
        )
        .required_param("name", ParameterKind::String, "Saved webhook name")
        .optional_param(
            "payload",
            ParameterKind::String,
            "JSON object to post, or plain text wrapped as {\"message\": ...}",
        ),
        handler_fn(move |args| {
            let tx = Arc::clone(&tx);
            let dir = Arc::clone(&dir);
            async move {
                let name = required_str(&args, "name")?;
                let Some(url) = dir.url_for(&name) else {
                    return Err(CapabilityError::NotFound(format!(
                        "saved webhook: {name}"
                    ))
                    .into());
                };
                let payload = decode_payload(optional_str(&args, "payload"));
                let status = tx.send(url, &payload).await?;
                Ok(serde_json::json!({
                    "result": format!("Webhook '{name}' triggered; the server answered {status}.")
                }))
            }
        }),
    );

    let dir = Arc::clone(&directory);
    bundle.push(
        ToolDefinition::new("webhook_list", "List the user's saved webhooks."),
        handler_fn(move |_args| {
            let dir = Arc::clone(&dir);
            async move {
                let spoken = if dir.is_empty() {
                    "There are no saved webhooks.".to_string()
                } else {
                    let names = dir.names();
                    format!(
                        "There are {} saved webhook(s): {}",
                        names.len(),
                        names.join(", ")
                    )
                };
                Ok(serde_json::json!({ "result": spoken }))
            }
        }),
    );

    bundle
}
