//! Spreadsheet actions behind a [`SheetStore`] seam.
//!
//! Cell data crosses the tool boundary as JSON-array strings (the live
//! model serializes structured arguments as strings), parsed here into
//! rows of cells before the store ever sees them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::tools::{ParameterKind, ToolDefinition, handler_fn};

use super::{CapabilityBundle, CapabilityError, optional_str, required_str};

const DEFAULT_READ_RANGE: &str = "Sheet1!A1:Z100";
/// Rows spoken before a read is summarized.
const READ_ROW_LIMIT: usize = 10;

/// Spreadsheet backend seam. Ranges use A1 notation
/// (e.g. `Sheet1!A1:D10`); cells are carried as strings.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Read a range; returns the populated rows.
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, CapabilityError>;

    /// Overwrite a range with `rows`; returns the number of cells written.
    async fn write_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<usize, CapabilityError>;

    /// Append `rows` after the existing data in `range`'s sheet; returns
    /// the number of rows appended.
    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<usize, CapabilityError>;

    /// Create a spreadsheet with the given sheet tabs (a single default
    /// tab when empty); returns the new spreadsheet id.
    async fn create_spreadsheet(
        &self,
        title: &str,
        sheets: Vec<String>,
    ) -> Result<String, CapabilityError>;

    /// Add a tab to an existing spreadsheet.
    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<(), CapabilityError>;

    /// Delete a tab. Permanent.
    async fn delete_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<(), CapabilityError>;
}

/// Parse the `values` argument: a JSON array of rows, each row an array
/// of scalar cells. Strings pass through; other scalars are stringified.
fn parse_rows(raw: &str) -> Result<Vec<Vec<String>>, CapabilityError> {
    let parsed: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
        CapabilityError::InvalidInput(format!("values must be a JSON array of rows: {e}"))
    })?;
    let serde_json::Value::Array(rows) = parsed else {
        return Err(CapabilityError::InvalidInput(
            "values must be a JSON array of rows".to_string(),
        ));
    };
    rows.into_iter()
        .map(|row| {
            let serde_json::Value::Array(cells) = row else {
                return Err(CapabilityError::InvalidInput(
                    "each row in values must be a JSON array of cells".to_string(),
                ));
            };
            Ok(cells
                .into_iter()
                .map(|cell| match cell {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect())
        })
        .collect()
}

fn format_rows(range: &str, rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return format!("The range '{range}' is empty.");
    }
    let shown: Vec<String> = rows
        .iter()
        .take(READ_ROW_LIMIT)
        .map(|row| row.join(", "))
        .collect();
    let mut out = format!(
        "Read {} row(s) from '{range}': {}",
        rows.len(),
        shown.join(" | ")
    );
    if rows.len() > READ_ROW_LIMIT {
        out.push_str(&format!(" ... and {} more rows", rows.len() - READ_ROW_LIMIT));
    }
    out
}

/// Bundle the spreadsheet tools over `store`.
pub fn bundle(store: Arc<dyn SheetStore>) -> CapabilityBundle {
    let mut bundle = CapabilityBundle::new();

    let sheets = Arc::clone(&store);
    bundle.push(
        ToolDefinition::new("sheet_read", "Read data from a spreadsheet.")
            .required_param(
                "spreadsheet_id",
                ParameterKind::String,
                "Spreadsheet id (from its URL)",
            )
            .optional_param(
                "range",
                ParameterKind::String,
                "A1-notation range, e.g. 'Sheet1!A1:D10'; defaults to 'Sheet1!A1:Z100'",
            ),
        handler_fn(move |args| {
            let sheets = Arc::clone(&sheets);
            async move {
                let id = required_str(&args, "spreadsheet_id")?;
                let range =
                    optional_str(&args, "range").unwrap_or_else(|| DEFAULT_READ_RANGE.to_string());
                let rows = sheets.read_range(&id, &range).await?;
                Ok(serde_json::json!({ "result": format_rows(&range, &rows) }))
            }
        }),
    );

    let sheets = Arc::clone(&store);
    bundle.push(
        ToolDefinition::new("sheet_write", "Write cells into a spreadsheet range.")
            .required_param("spreadsheet_id", ParameterKind::String, "Spreadsheet id")
            .required_param(
                "range",
                ParameterKind::String,
                "A1-notation range to write, e.g. 'Sheet1!A1'",
            )
            .required_param(
                "values",
                ParameterKind::String,
                "JSON array of rows, e.g. '[[\"Name\", \"Age\"], [\"John\", 30]]'",
            ),
        handler_fn(move |args| {
            let sheets = Arc::clone(&sheets);
            async move {
                let id = required_str(&args, "spreadsheet_id")?;
                let range = required_str(&args, "range")?;
                let rows = parse_rows(&required_str(&args, "values")?)?;
                let cells = sheets.write_range(&id, &range, rows).await?;
                Ok(serde_json::json!({
                    "result": format!("Updated {cells} cell(s) in '{range}'.")
                }))
            }
        }),
    );

    let sheets = Arc::clone(&store);
    bundle.push(
        ToolDefinition::new(
            "sheet_append",
            "Append rows to a spreadsheet without overwriting existing data.",
        )
        .required_param("spreadsheet_id", ParameterKind::String, "Spreadsheet id")
        .required_param(
            "range",
            ParameterKind::String,
            "A1-notation range identifying the sheet to append to, e.g. 'Sheet1!A:D'",
        )
        .required_param(
            "values",
            ParameterKind::String,
            "JSON array of rows to append, e.g. '[[\"John\", 30, \"Engineer\"]]'",
        ),
        handler_fn(move |args| {
            let sheets = Arc::clone(&sheets);
            async move {
                let id = required_str(&args, "spreadsheet_id")?;
                let range = required_str(&args, "range")?;
                let rows = parse_rows(&required_str(&args, "values")?)?;
                let appended = sheets.append_rows(&id, &range, rows).await?;
                Ok(serde_json::json!({
                    "result": format!("Appended {appended} row(s) to '{range}'.")
                }))
            }
        }),
    );

    let sheets = Arc::clone(&store);
    bundle.push(
        ToolDefinition::new("sheet_create", "Create a new spreadsheet.")
            .required_param("title", ParameterKind::String, "Title of the new spreadsheet")
            .optional_param(
                "sheets",
                ParameterKind::String,
                "Comma-separated tab names; a single default tab when omitted",
            ),
        handler_fn(move |args| {
            let sheets = Arc::clone(&sheets);
            async move {
                let title = required_str(&args, "title")?;
                let tabs: Vec<String> = optional_str(&args, "sheets")
                    .map(|raw| {
                        raw.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_owned)
                            .collect()
                    })
                    .unwrap_or_default();
                let id = sheets.create_spreadsheet(&title, tabs).await?;
                Ok(serde_json::json!({
                    "result": format!("Created spreadsheet '{title}' (id {id}).")
                }))
            }
        }),
    );

    let sheets = Arc::clone(&store);
    bundle.push(
        ToolDefinition::new("sheet_add_tab", "Add a tab to an existing spreadsheet.")
            .required_param("spreadsheet_id", ParameterKind::String, "Spreadsheet id")
            .required_param("title", ParameterKind::String, "Title of the new tab"),
        handler_fn(move |args| {
            let sheets = Arc::clone(&sheets);
            async move {
                let id = required_str(&args, "spreadsheet_id")?;
                let title = required_str(&args, "title")?;
                sheets.add_sheet(&id, &title).await?;
                Ok(serde_json::json!({
                    "result": format!("Added tab '{title}' to the spreadsheet.")
                }))
            }
        }),
    );

    let sheets = Arc::clone(&store);
    bundle.push(
        ToolDefinition::new(
            "sheet_delete_tab",
            "Delete a tab from a spreadsheet. This is permanent.",
        )
        .required_param("spreadsheet_id", ParameterKind::String, "Spreadsheet id")
        .required_param("title", ParameterKind::String, "Title of the tab to delete"),
        handler_fn(move |args| {
            let sheets = Arc::clone(&sheets);
            async move {
                let id = required_str(&args, "spreadsheet_id")?;
                let title = required_str(&args, "title")?;
                sheets.delete_sheet(&id, &title).await?;
                Ok(serde_json::json!({
                    "result": format!("Deleted tab '{title}' from the spreadsheet.")
                }))
            }
        }),
    );

    bundle
}
