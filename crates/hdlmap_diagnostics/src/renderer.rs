//! Diagnostic rendering for terminals and batch log files.

use crate::diagnostic::{Diagnostic, LabelStyle, Severity};
use hdlmap_source::{SourceDb, Span};

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;

    /// Renders every diagnostic in order, concatenated.
    fn render_all(&self, diags: &[Diagnostic], source_db: &SourceDb) -> String {
        diags.iter().map(|d| self.render(d, source_db)).collect()
    }
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// warning[W103]: module 'alu' is declared more than once
///   --> rtl/alu2.v:1:1
///    |
///  1 | module alu(input a);
///    | ^^^^^^^^^^
///    |
///   ::: rtl/alu.v:3:1 first declared here
///    = note: both declarations are kept
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Note => "36",
            Severity::Help => "32",
        };
        format!("\x1b[1;{code}m{text}\x1b[0m")
    }

    fn render_snippet(&self, out: &mut String, span: Span, message: Option<&str>, db: &SourceDb) {
        let file = db.get_file(span.file);
        let (line, col) = file.line_col(span.start);
        let line_num = line.to_string();
        let padding = " ".repeat(line_num.len());
        let text = file.line_text(span.start);

        // Underline at most to the end of the first line.
        let remaining = text.len().saturating_sub(col as usize - 1).max(1);
        let carets = "^".repeat((span.len() as usize).clamp(1, remaining));
        let col_padding = " ".repeat((col as usize).saturating_sub(1));
        let msg = message.map(|m| format!(" {m}")).unwrap_or_default();

        out.push_str(&format!("{padding} |\n"));
        out.push_str(&format!("{line_num} | {text}\n"));
        out.push_str(&format!("{padding} | {col_padding}{carets}{msg}\n"));
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();

        let head = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!("{}: {}\n", self.paint(diag.severity, &head), diag.message));

        if !diag.primary_span.is_dummy() {
            let resolved = source_db.resolve_span(diag.primary_span);
            out.push_str(&format!("  --> {resolved}\n"));
            let primary_msg = diag
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
                .map(|l| l.message.as_str());
            self.render_snippet(&mut out, diag.primary_span, primary_msg, source_db);
        } else if let Some(path) = &diag.path {
            out.push_str(&format!("  --> {path}\n"));
        }

        for label in diag
            .labels
            .iter()
            .filter(|l| l.style == LabelStyle::Secondary && !l.span.is_dummy())
        {
            let resolved = source_db.resolve_span(label.span);
            out.push_str(&format!("  ::: {resolved} {}\n", label.message));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}
