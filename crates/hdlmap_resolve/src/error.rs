//! Resolver construction errors.

/// Errors raised while building a [`TopResolver`](crate::TopResolver).
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A name rule's pattern is not a valid regular expression.
    #[error("name rule '{name}' has an invalid pattern: {source}")]
    InvalidRule {
        /// Rule name.
        name: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },
}
