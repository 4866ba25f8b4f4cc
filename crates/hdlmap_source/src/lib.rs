//! Source tree discovery, file loading, and span tracking for diagnostics.
//!
//! This crate walks a repository snapshot into a [`SourceTree`] (skipping
//! build, vendor, test and version-control directories), loads files into a
//! [`SourceDb`], and provides [`FileId`] and [`Span`] types plus
//! [`ResolvedSpan`] for converting byte offsets to line/column coordinates.

#![warn(missing_docs)]

pub mod file_id;
pub mod resolved_span;
pub mod source_db;
pub mod source_file;
pub mod span;
pub mod tree;

pub use file_id::FileId;
pub use resolved_span::ResolvedSpan;
pub use source_db::SourceDb;
pub use source_file::SourceFile;
pub use span::Span;
pub use tree::{relative_path, DiscoveryOptions, SourceEntry, SourceTree};
