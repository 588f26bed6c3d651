//! Calendar actions behind a [`CalendarStore`] seam.
//!
//! The store abstracts whatever calendar backend the deployment wires in;
//! the tools only parse arguments, delegate, and phrase results for
//! speech.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::tools::{ParameterKind, ToolDefinition, handler_fn};

use super::{CapabilityBundle, CapabilityError, optional_str, optional_u64, required_str};

const DEFAULT_LIST_LIMIT: usize = 10;

/// One calendar event.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Calendar backend seam.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Upcoming events, soonest first, at most `max`.
    async fn list_events(&self, max: usize) -> Result<Vec<CalendarEvent>, CapabilityError>;

    /// Create an event; returns it with its backend-assigned id.
    async fn create_event(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        description: Option<&str>,
    ) -> Result<CalendarEvent, CapabilityError>;
}

fn parse_time(raw: &str, field: &str) -> Result<DateTime<Utc>, CapabilityError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            CapabilityError::InvalidInput(format!("{field} must be RFC 3339 ({e}): {raw}"))
        })
}

fn spoken_time(dt: &DateTime<Utc>) -> String {
    dt.format("%B %-d at %H:%M").to_string()
}

fn format_events(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return "There are no upcoming events on the calendar.".to_string();
    }
    let lines: Vec<String> = events
        .iter()
        .map(|e| format!("'{}' on {}", e.summary, spoken_time(&e.start)))
        .collect();
    format!(
        "There are {} upcoming event(s): {}",
        events.len(),
        lines.join("; ")
    )
}

/// Bundle the calendar tools over `store`.
pub fn bundle(store: Arc<dyn CalendarStore>) -> CapabilityBundle {
    let mut bundle = CapabilityBundle::new();

    let cal = Arc::clone(&store);
    bundle.push(
        ToolDefinition::new(
            "calendar_list_events",
            "List the user's upcoming calendar events.",
        )
        .optional_param(
            "max_results",
            ParameterKind::Integer,
            "Maximum number of events to list; defaults to 10",
        ),
        handler_fn(move |args| {
            let cal = Arc::clone(&cal);
            async move {
                let max = optional_u64(&args, "max_results")
                    .map(|n| n as usize)
                    .unwrap_or(DEFAULT_LIST_LIMIT);
                let events = cal.list_events(max).await?;
                Ok(serde_json::json!({ "result": format_events(&events) }))
            }
        }),
    );

    let cal = Arc::clone(&store);
    bundle.push(
        ToolDefinition::new(
            "calendar_create_event",
            "Create a new event on the user's calendar.",
        )
        .required_param("summary", ParameterKind::String, "Event title")
        .required_param(
            "start_time",
            ParameterKind::String,
            "Event start, RFC 3339 (e.g. 2026-09-01T14:00:00Z)",
        )
        .required_param("end_time", ParameterKind::String, "Event end, RFC 3339")
        .optional_param("description", ParameterKind::String, "Optional event notes"),
        handler_fn(move |args| {
            let cal = Arc::clone(&cal);
            async move {
                let summary = required_str(&args, "summary")?;
                let start = parse_time(&required_str(&args, "start_time")?, "start_time")?;
                let end = parse_time(&required_str(&args, "end_time")?, "end_time")?;
                if end <= start {
                    return Err(CapabilityError::InvalidInput(
                        "end_time must be after start_time".to_string(),
                    )
                    .into());
                }
                let description = optional_str(&args, "description");
                let event = cal
                    .create_event(&summary, start, end, description.as_deref())
                    .await?;
                Ok(serde_json::json!({
                    "result": format!(
                        "Created event '{}' on {}.",
                        event.summary,
                        spoken_time(&event.start)
                    )
                }))
            }
        }),
    );

    bundle
}
