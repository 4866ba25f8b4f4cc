//! Structured diagnostics for repository analysis.
//!
//! Scanners, the resolver and the descriptor locator report recoverable
//! problems as [`Diagnostic`] values with a [`DiagnosticCode`] and an optional
//! source location. The thread-safe [`DiagnosticSink`] collects them during a
//! run, and [`TerminalRenderer`] formats them for the console and batch logs.

#![warn(missing_docs)]

pub mod code;
pub mod codes;
pub mod diagnostic;
pub mod renderer;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Label, LabelStyle, Severity};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use sink::DiagnosticSink;
