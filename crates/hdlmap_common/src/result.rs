//! Common result and error types for the hdlmap workspace.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in hdlmap), not a
/// problem with the analysed repository. Repository problems are reported
/// through the diagnostic sink or as explicit analysis error variants.
pub type HdlResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in hdlmap, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("graph lost a node");
        assert_eq!(format!("{err}"), "internal error: graph lost a node");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "bad state".to_string().into();
        assert_eq!(err.message, "bad state");
    }
}
