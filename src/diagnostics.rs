//! Diagnostics reported to the caller while an archive is ingested.
//!
//! The extractor never keeps a log buffer of its own: every progress marker
//! and skipped entry goes to a [`DiagnosticSink`] supplied by the caller.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Receiver of [`Diagnostic`] records.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Diagnostic) + Send + Sync,
{
    fn emit(&self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Forwards records over a channel. A closed receiver drops them.
impl DiagnosticSink for mpsc::UnboundedSender<Diagnostic> {
    fn emit(&self, diagnostic: Diagnostic) {
        let _ = self.send(diagnostic);
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _diagnostic: Diagnostic) {}
}

/// Logs records through `tracing`, mapping `error` to `ERROR` and the rest to `INFO`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}", diagnostic.message),
            severity => tracing::info!(%severity, "{}", diagnostic.message),
        }
    }
}

/// Collects records in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far, in emission order.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<Diagnostic> {
        self.records()
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut records) = self.records.lock() {
            records.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Diagnostic::success("done")).unwrap();
        assert_eq!(json, r#"{"severity":"success","message":"done"}"#);
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |d: Diagnostic| seen.lock().unwrap().push(d.message);
        sink.emit(Diagnostic::info("one"));
        sink.emit(Diagnostic::error("two"));
        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn channel_sink_forwards_records() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.emit(Diagnostic::error("bad entry"));
        drop(tx);
        assert_eq!(rx.recv().await, Some(Diagnostic::error("bad entry")));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn memory_sink_filters_errors() {
        let sink = MemorySink::new();
        sink.emit(Diagnostic::info("a"));
        sink.emit(Diagnostic::error("b"));
        assert_eq!(sink.records().len(), 2);
        assert_eq!(sink.errors(), vec![Diagnostic::error("b")]);
    }
}
