//! Front-end scanners that turn HDL source trees into a module model.
//!
//! Each supported [`Dialect`](hdlmap_common::Dialect) has one [`Scanner`]
//! that recognizes unit declarations, instantiations and interfaces by
//! lexical pattern matching over comment-blanked text. The
//! [`ScannerRegistry`] maps dialect tags to scanners, [`detect_dialect`]
//! picks the project dialect once, and [`scan_project`] runs the selected
//! scanner over every file in parallel and merges the results in path order.

#![warn(missing_docs)]

pub mod detect;
pub mod error;
pub mod lexer;
pub mod model;
pub mod project;
pub mod registry;
pub mod scanner;
pub mod scanners;

pub use detect::{detect_dialect, scala_flavor};
pub use error::ScanError;
pub use model::{
    FileScan, IncludeRef, Instantiation, Interface, Module, ModuleAttribute, PackageDecl,
    PackageImport,
};
pub use project::{scan_project, ProjectScan};
pub use registry::ScannerRegistry;
pub use scanner::Scanner;
