//! Structured diagnostic messages with severity, codes and labels.

use std::fmt;

use crate::code::DiagnosticCode;
use hdlmap_source::Span;
use serde::{Deserialize, Serialize};

/// How serious a diagnostic is, from `Help` up to `Error`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// A suggestion.
    Help,
    /// A recorded heuristic decision.
    Note,
    /// A problem analysis recovered from.
    Warning,
    /// A problem that prevents a configuration from being produced.
    Error,
}

impl Severity {
    /// Returns `true` for [`Severity::Error`].
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// The lowercase word printed before the code.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Help => "help",
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a label marks the main location (`^^^`) or context (`---`).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// The location the message is about.
    Primary,
    /// A related location, such as an earlier declaration.
    Secondary,
}

/// A span annotated with a short message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// Annotated span.
    pub span: Span,
    /// Text shown beside the underline.
    pub message: String,
    /// Primary or secondary.
    pub style: LabelStyle,
}

impl Label {
    fn styled(style: LabelStyle, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style,
        }
    }

    /// A label on the main location.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self::styled(LabelStyle::Primary, span, message)
    }

    /// A label on a related location.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self::styled(LabelStyle::Secondary, span, message)
    }
}

/// A structured diagnostic message.
///
/// A diagnostic points at a source span when one exists. Problems about a file
/// that never made it into the source database (an unreadable file, a
/// descriptor location) carry a project-relative `path` instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// The primary source span, or [`Span::DUMMY`].
    pub primary_span: Span,
    /// A project-relative path for diagnostics without a span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Additional annotated source spans providing context.
    pub labels: Vec<Label>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
    /// Actionable suggestions.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            primary_span: span,
            path: None,
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Error, code, message, span)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Warning, code, message, span)
    }

    /// Creates a new note diagnostic, used for recorded heuristic decisions.
    pub fn note(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Note, code, message, span)
    }

    /// Attaches a project-relative path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a label to this diagnostic.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}
