//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating an `hdlmap.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A `[dialects.<tag>]` table names a dialect that does not exist.
    #[error("unknown dialect '{0}' in [dialects]")]
    UnknownDialect(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_dialect() {
        let err = ConfigError::UnknownDialect("myhdl".to_string());
        assert_eq!(err.to_string(), "unknown dialect 'myhdl' in [dialects]");
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            err.to_string(),
            "failed to parse configuration: expected '=' at line 3"
        );
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(err.to_string().starts_with("failed to read configuration:"));
    }
}
