//! Diagnostics emitted while building.
//!
//! Nothing in the pipeline prints directly. Every notice, warning and
//! recoverable failure is handed to a [`Reporter`], so the binary can route
//! them into `tracing` while tests collect and inspect them.

use std::fmt;
use std::sync::Mutex;

/// Something worth telling the user about that did not stop the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The source directory did not exist and was created empty
    SourceDirCreated { path: String },
    /// The source directory could not be created or listed
    SourceDirUnreadable { path: String, message: String },
    /// A file whose extension no parser is registered for
    FileSkipped { file: String },
    /// A file that could not be read or parsed; none of its records are used
    FileFailed { file: String, message: String },
    /// A record without a usable title or start
    RecordRejected { origin: String, raw: String },
    /// A calendar time that does not convert to a valid instant
    InvalidInstant {
        origin: String,
        field: &'static str,
        value: String,
    },
    /// Date text that matches neither accepted shape; the value is kept
    DateShape {
        origin: String,
        field: &'static str,
        value: String,
    },
    /// The .ics artifact was not written
    CalendarSkipped { message: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::SourceDirCreated { .. } | Diagnostic::FileSkipped { .. } => Severity::Notice,
            Diagnostic::RecordRejected { .. }
            | Diagnostic::InvalidInstant { .. }
            | Diagnostic::DateShape { .. } => Severity::Warning,
            Diagnostic::SourceDirUnreadable { .. }
            | Diagnostic::FileFailed { .. }
            | Diagnostic::CalendarSkipped { .. } => Severity::Error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::SourceDirCreated { path } => {
                write!(f, "Source directory {path} did not exist, created it")
            }
            Diagnostic::SourceDirUnreadable { path, message } => {
                write!(f, "Could not read source directory {path}: {message}")
            }
            Diagnostic::FileSkipped { file } => {
                write!(f, "Skipping {file}: unsupported file type")
            }
            Diagnostic::FileFailed { file, message } => {
                write!(f, "Failed to parse {file}: {message}")
            }
            Diagnostic::RecordRejected { origin, raw } => {
                write!(f, "Skipping record in {origin} without title or start: {raw}")
            }
            Diagnostic::InvalidInstant {
                origin,
                field,
                value,
            } => write!(f, "Dropping invalid {field} '{value}' in {origin}"),
            Diagnostic::DateShape {
                origin,
                field,
                value,
            } => write!(
                f,
                "Unexpected {field} format '{value}' in {origin} (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM)"
            ),
            Diagnostic::CalendarSkipped { message } => {
                write!(f, "Skipping calendar export: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

/// Sink for diagnostics.
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Notice => tracing::info!("{diagnostic}"),
            Severity::Warning => tracing::warn!("{diagnostic}"),
            Severity::Error => tracing::error!("{diagnostic}"),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics()
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        match self.diagnostics.lock() {
            Ok(mut diagnostics) => diagnostics.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
