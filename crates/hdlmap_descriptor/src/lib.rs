//! Build-descriptor location and synthesis for namespace-based dialects.
//!
//! Chisel and SpinalHDL designs only become HDL after a build tool runs a
//! small application object against the top module. [`DescriptorLocator`]
//! finds (or writes) the build descriptor for the top module's sub-project
//! and places (or reuses) that entry point in the right namespace. Every
//! write goes through [`write_new`], which never overwrites an existing file.

#![warn(missing_docs)]

pub mod entry;
pub mod error;
pub mod locate;
pub mod namespace;
pub mod template;
pub mod write;

pub use entry::EntryPoint;
pub use error::DescriptorError;
pub use locate::{find_descriptors, BuildDescriptor, DescriptorLocator, Strategy};
pub use namespace::{detect_namespace, Namespace};
pub use write::{write_new, WriteOutcome};
