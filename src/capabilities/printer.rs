//! Printing actions behind a [`PrintStation`] seam.
//!
//! Four tools mirror what the voice flow needs: discover printers, print
//! a file, print ad-hoc text, and read back a printer's status.

use std::sync::Arc;

use async_trait::async_trait;

use crate::tools::{ParameterKind, ToolDefinition, handler_fn};

use super::{CapabilityBundle, CapabilityError, optional_str, optional_u64, required_str};

/// State of one print queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterState {
    Idle,
    Printing,
    Offline,
}

impl PrinterState {
    fn spoken(&self) -> &'static str {
        match self {
            PrinterState::Idle => "idle and ready",
            PrinterState::Printing => "busy printing",
            PrinterState::Offline => "offline",
        }
    }
}

/// A discovered printer.
#[derive(Debug, Clone)]
pub struct PrinterInfo {
    pub name: String,
    pub state: PrinterState,
    pub jobs_queued: usize,
}

/// Print backend seam.
#[async_trait]
pub trait PrintStation: Send + Sync {
    /// All known printers.
    async fn list_printers(&self) -> Result<Vec<PrinterInfo>, CapabilityError>;

    /// Queue a file for printing; returns the backend job id.
    async fn print_file(
        &self,
        printer: Option<&str>,
        path: &str,
        copies: usize,
    ) -> Result<String, CapabilityError>;

    /// Queue ad-hoc text for printing; returns the backend job id.
    async fn print_text(
        &self,
        printer: Option<&str>,
        text: &str,
    ) -> Result<String, CapabilityError>;

    /// Status of one printer.
    async fn printer_status(&self, printer: &str) -> Result<PrinterInfo, CapabilityError>;
}

fn format_printers(printers: &[PrinterInfo]) -> String {
    if printers.is_empty() {
        return "No printers are available.".to_string();
    }
    let lines: Vec<String> = printers
        .iter()
        .map(|p| format!("{} ({})", p.name, p.state.spoken()))
        .collect();
    format!(
        "There are {} printer(s): {}",
        printers.len(),
        lines.join("; ")
    )
}

fn format_status(info: &PrinterInfo) -> String {
    if info.jobs_queued == 0 {
        format!("Printer '{}' is {}.", info.name, info.state.spoken())
    } else {
        format!(
            "Printer '{}' is {} with {} job(s) queued.",
            info.name,
            info.state.spoken(),
            info.jobs_queued
        )
    }
}

/// Bundle the printing tools over `station`.
pub fn bundle(station: Arc<dyn PrintStation>) -> CapabilityBundle {
    let mut bundle = CapabilityBundle::new();

    let ps = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new("doc_list_printers", "List the available printers."),
        handler_fn(move |_args| {
            let ps = Arc::clone(&ps);
            async move {
                let printers = ps.list_printers().await?;
                Ok(serde_json::json!({ "result": format_printers(&printers) }))
            }
        }),
    );

    let ps = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new("doc_print_file", "Print a file from the workstation.")
            .required_param("path", ParameterKind::String, "Workspace-relative file path")
            .optional_param(
                "printer",
                ParameterKind::String,
                "Printer name; the default printer when omitted",
            )
            .optional_param(
                "copies",
                ParameterKind::Integer,
                "Number of copies; defaults to 1",
            ),
        handler_fn(move |args| {
            let ps = Arc::clone(&ps);
            async move {
                let path = required_str(&args, "path")?;
                let printer = optional_str(&args, "printer");
                let copies = optional_u64(&args, "copies").unwrap_or(1).max(1) as usize;
                let job = ps.print_file(printer.as_deref(), &path, copies).await?;
                Ok(serde_json::json!({
                    "result": format!("Sent '{path}' to the printer (job {job}).")
                }))
            }
        }),
    );

    let ps = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new("doc_print_text", "Print a short piece of text.")
            .required_param("text", ParameterKind::String, "Text to print")
            .optional_param(
                "printer",
                ParameterKind::String,
                "Printer name; the default printer when omitted",
            ),
        handler_fn(move |args| {
            let ps = Arc::clone(&ps);
            async move {
                let text = required_str(&args, "text")?;
                let printer = optional_str(&args, "printer");
                let job = ps.print_text(printer.as_deref(), &text).await?;
                Ok(serde_json::json!({
                    "result": format!("Sent the text to the printer (job {job}).")
                }))
            }
        }),
    );

    let ps = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new("doc_printer_status", "Check a printer's status.").required_param(
            "printer",
            ParameterKind::String,
            "Printer name",
        ),
        handler_fn(move |args| {
            let ps = Arc::clone(&ps);
            async move {
                let printer = required_str(&args, "printer")?;
                let info = ps.printer_status(&printer).await?;
                Ok(serde_json::json!({ "result": format_status(&info) }))
            }
        }),
    );

    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolHandler;
    use std::sync::Mutex;

    struct MemoryPrintStation {
        printers: Vec<PrinterInfo>,
        jobs: Mutex<Vec<String>>,
    }

    impl MemoryPrintStation {
        fn with_printers(printers: Vec<PrinterInfo>) -> Self {
            Self {
                printers,
                jobs: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PrintStation for MemoryPrintStation {
        async fn list_printers(&self) -> Result<Vec<PrinterInfo>, CapabilityError> {
            Ok(self.printers.clone())
        }

        async fn print_file(
            &self,
            _printer: Option<&str>,
            path: &str,
            copies: usize,
        ) -> Result<String, CapabilityError> {
            let mut jobs = self.jobs.lock().expect("jobs lock");
            jobs.push(format!("{path} x{copies}"));
            Ok(format!("{}", jobs.len()))
        }

        async fn print_text(
            &self,
            _printer: Option<&str>,
            text: &str,
        ) -> Result<String, CapabilityError> {
            let mut jobs = self.jobs.lock().expect("jobs lock");
            jobs.push(text.to_string());
            Ok(format!("{}", jobs.len()))
        }

        async fn printer_status(&self, printer: &str) -> Result<PrinterInfo, CapabilityError> {
            self.printers
                .iter()
                .find(|p| p.name == printer)
                .cloned()
                .ok_or_else(|| CapabilityError::NotFound(format!("printer: {printer}")))
        }
    }

    fn args(pairs: &[(&str, serde_json::Value)]) -> crate::tools::ArgMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn office_printer() -> PrinterInfo {
        PrinterInfo {
            name: "office".to_string(),
            state: PrinterState::Idle,
            jobs_queued: 0,
        }
    }

    #[tokio::test]
    async fn no_printers_is_a_clear_answer() {
        let station = Arc::new(MemoryPrintStation::with_printers(vec![]));
        let bundle = bundle(station);
        let (_, list) = &bundle.entries[0];

        let out = list.call(args(&[])).await.unwrap();
        assert_eq!(out["result"], "No printers are available.");
    }

    #[tokio::test]
    async fn print_file_defaults_copies_to_one() {
        let station = Arc::new(MemoryPrintStation::with_printers(vec![office_printer()]));
        let bundle = bundle(Arc::clone(&station) as Arc<dyn PrintStation>);
        let (_, print) = &bundle.entries[1];

        let out = print
            .call(args(&[("path", serde_json::json!("report.pdf"))]))
            .await
            .unwrap();
        assert!(out["result"].as_str().unwrap().contains("report.pdf"));
        assert_eq!(
            *station.jobs.lock().unwrap(),
            vec!["report.pdf x1".to_string()]
        );
    }

    #[tokio::test]
    async fn unknown_printer_status_is_an_error() {
        let station = Arc::new(MemoryPrintStation::with_printers(vec![office_printer()]));
        let bundle = bundle(station);
        let (_, status) = &bundle.entries[3];

        let err = status
            .call(args(&[("printer", serde_json::json!("attic"))]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn busy_status_mentions_queue_depth() {
        let station = Arc::new(MemoryPrintStation::with_printers(vec![PrinterInfo {
            name: "office".to_string(),
            state: PrinterState::Printing,
            jobs_queued: 3,
        }]));
        let bundle = bundle(station);
        let (_, status) = &bundle.entries[3];

        let out = status
            .call(args(&[("printer", serde_json::json!("office"))]))
            .await
            .unwrap();
        assert_eq!(
            out["result"],
            "Printer 'office' is busy printing with 3 job(s) queued."
        );
    }
}
