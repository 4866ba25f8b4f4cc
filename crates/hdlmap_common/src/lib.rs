//! Shared foundational types used across the hdlmap workspace.
//!
//! This crate provides the [`Dialect`] tags that key every front-end, content
//! hashing for idempotent file generation, and the internal-error result type.

#![warn(missing_docs)]

pub mod dialect;
pub mod hash;
pub mod result;

pub use dialect::{Dialect, DialectFamily, UnknownDialect};
pub use hash::ContentHash;
pub use result::{HdlResult, InternalError};
