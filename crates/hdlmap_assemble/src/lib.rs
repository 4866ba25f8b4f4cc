//! Analysis orchestration and the final configuration record.
//!
//! [`analyze_project`] runs discovery, scanning, graph construction, top
//! resolution and (for namespace-based dialects) descriptor placement, then
//! hands everything to the [`Assembler`] which derives the
//! [`ConfigDescriptor`]. An optional [`Compiler`] is invoked afterwards; its
//! outcome is recorded and never turns a produced descriptor into a failure.

#![warn(missing_docs)]

pub mod analyze;
pub mod assemble;
pub mod compile;
pub mod descriptor;
pub mod error;

pub use analyze::{analyze_project, scan_tree, AnalysisReport, AnalysisRequest, ScannedProject};
pub use assemble::{AssembleInput, Assembler};
pub use compile::{CommandCompiler, CompileError, CompileOutcome, CompileRequest, Compiler};
pub use descriptor::{ConfigDescriptor, ModuleEntry};
pub use error::AnalysisError;
