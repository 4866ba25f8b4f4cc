//! Top-module resolution.
//!
//! Every scanned module is scored by independent additive signals (name
//! affinity to the repository, naming conventions, negative indicators,
//! graph fan-in and fan-out, dialect attributes and interface affinity).
//! [`TopResolver`] ranks the candidates, applies the eligibility tiers and
//! the deterministic tie-break, and returns a [`Resolution`].

#![warn(missing_docs)]

pub mod candidate;
pub mod error;
pub mod names;
pub mod resolver;

pub use candidate::{ResolvedTop, ScoredCandidate, Signal};
pub use error::ResolveError;
pub use names::{normalize, similarity, snake_case};
pub use resolver::{Resolution, TopResolver};
