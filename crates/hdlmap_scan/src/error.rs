//! Per-file scan failures.

use hdlmap_diagnostics::{codes, Diagnostic};
use hdlmap_source::Span;

/// A file that could not be scanned.
///
/// Scan errors never abort a project scan; they become `E101` diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Unreadable {
        /// Project-relative path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Converts this error into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ScanError::Unreadable { path, source } => Diagnostic::error(
                codes::UNREADABLE_FILE,
                format!("cannot read source file '{path}'"),
                Span::DUMMY,
            )
            .with_path(path.clone())
            .with_note(source.to_string())
            .with_help("the file was skipped; check its permissions"),
        }
    }
}
