//! Sink abstraction and the always-available buffered fallback.
//!
//! A unit writes every record through exactly one [`LogSink`]: its own
//! [`BufferedSink`] while no backend holds it, or the handle the backend
//! returned at registration.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::enabling_state::Severity;

/// Where a record was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    pub module_path: &'static str,
}

impl SourceLocation {
    /// Builds a location, keeping only the base name of `file`.
    pub fn new(file: &'static str, line: u32, module_path: &'static str) -> Self {
        Self {
            file: file_name(file),
            line,
            module_path,
        }
    }
}

fn file_name(path: &'static str) -> &'static str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// One formatted trace record, borrowed for the duration of a single write.
#[derive(Debug, Clone, Copy)]
pub struct TraceRecord<'a> {
    pub severity: Severity,
    pub diagnosis_code: u32,
    pub entity: &'a str,
    pub origin: &'a str,
    pub location: SourceLocation,
    pub message: fmt::Arguments<'a>,
}

/// Uniform write primitive shared by the buffered sink and backend sinks.
///
/// Implementations are called from real-time paths and must not block.
pub trait LogSink: Send + Sync {
    fn log(&self, record: &TraceRecord<'_>);
}

/// Fallback sink that prints through `tracing` while no backend is attached.
#[derive(Debug)]
pub struct BufferedSink {
    name: String,
    errors: AtomicU64,
    warnings: AtomicU64,
    messages: AtomicU64,
}

impl BufferedSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            errors: AtomicU64::new(0),
            warnings: AtomicU64::new(0),
            messages: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of records this sink has printed for `severity`.
    pub fn emitted(&self, severity: Severity) -> u64 {
        self.counter(severity).load(Ordering::Relaxed)
    }

    /// Number of records this sink has printed in total.
    pub fn emitted_total(&self) -> u64 {
        self.emitted(Severity::Error) + self.emitted(Severity::Warning) + self.emitted(Severity::Info)
    }

    fn counter(&self, severity: Severity) -> &AtomicU64 {
        match severity {
            Severity::Error => &self.errors,
            Severity::Warning => &self.warnings,
            Severity::Info => &self.messages,
        }
    }
}

impl LogSink for BufferedSink {
    fn log(&self, record: &TraceRecord<'_>) {
        self.counter(record.severity).fetch_add(1, Ordering::Relaxed);

        macro_rules! buffered_event {
            ($level:expr) => {
                tracing::event!(
                    target: "trace_connect::buffered",
                    $level,
                    unit = %self.name,
                    code = record.diagnosis_code,
                    entity = record.entity,
                    origin = record.origin,
                    file = record.location.file,
                    line = record.location.line,
                    "{}",
                    record.message
                )
            };
        }

        match record.severity {
            Severity::Error => buffered_event!(tracing::Level::ERROR),
            Severity::Warning => buffered_event!(tracing::Level::WARN),
            Severity::Info => buffered_event!(tracing::Level::INFO),
        }
    }
}
