//! Descriptor and entry-point errors.

use std::path::PathBuf;

use hdlmap_diagnostics::{codes, Diagnostic};
use hdlmap_source::Span;

/// Errors raised while locating or writing generated files.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// The chosen location cannot be written.
    #[error("cannot write {path}: {source}")]
    NotWritable {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Another I/O failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A different file already exists at the destination.
    #[error("{path} already exists with different content")]
    Exists {
        /// The existing file.
        path: PathBuf,
    },
}

impl DescriptorError {
    /// Classifies an I/O failure at `path`.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => DescriptorError::NotWritable { path, source },
            _ => DescriptorError::Io { path, source },
        }
    }

    /// Converts this error into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            DescriptorError::NotWritable { path, .. } => Diagnostic::error(
                codes::NOT_WRITABLE,
                format!("cannot create generated file at {}", path.display()),
                Span::DUMMY,
            )
            .with_note(self.to_string())
            .with_help("make the directory writable or run with --dry-run"),
            DescriptorError::Exists { path } => Diagnostic::error(
                codes::NOT_WRITABLE,
                format!("refusing to overwrite {}", path.display()),
                Span::DUMMY,
            )
            .with_help("remove or rename the existing file"),
            DescriptorError::Io { .. } => {
                Diagnostic::error(codes::NOT_WRITABLE, self.to_string(), Span::DUMMY)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn permission_denied_is_not_writable() {
        let err = DescriptorError::from_io("/ro/build.sbt", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(err, DescriptorError::NotWritable { .. }));
        assert_eq!(err.to_diagnostic().code.to_string(), "E301");
    }

    #[test]
    fn other_failures_are_io() {
        let err = DescriptorError::from_io("/x", io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(matches!(err, DescriptorError::Io { .. }));
        assert!(err.to_string().contains("/x"));
    }
}
