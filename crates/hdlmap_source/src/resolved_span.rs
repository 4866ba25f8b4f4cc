//! Human-readable resolved source locations.

use std::fmt;

/// A span resolved to a project-relative path and line/column coordinates.
///
/// Lines and columns are 1-indexed. Produced by
/// [`SourceDb::resolve_span`](crate::SourceDb::resolve_span).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// The path of the source file relative to the project root.
    pub file: String,
    /// The starting line number (1-indexed).
    pub line: u32,
    /// The starting column number (1-indexed).
    pub col: u32,
}

impl fmt::Display for ResolvedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}
