//! The per-dialect scanner contract.

use hdlmap_common::Dialect;
use hdlmap_source::{SourceEntry, SourceFile};

use crate::model::FileScan;

/// A front-end that recognizes unit declarations in one dialect.
///
/// Scanners are stateless and shared across threads; `scan_file` is called
/// once per file and must never panic on malformed input. Unresolved
/// instantiations are returned as-is; resolution against the project's
/// module names happens after all files are scanned.
pub trait Scanner: Send + Sync {
    /// The dialect this scanner handles.
    fn dialect(&self) -> Dialect;

    /// Returns `true` if the scanner should read this file.
    fn accepts(&self, entry: &SourceEntry) -> bool;

    /// Scans one loaded file.
    fn scan_file(&self, file: &SourceFile) -> FileScan;
}
