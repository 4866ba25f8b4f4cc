//! Built-in scanners, one per dialect.

mod bluespec;
mod scala;
mod verilog;
mod vhdl;

pub use bluespec::BluespecScanner;
pub use scala::ScalaScanner;
pub use verilog::VerilogScanner;
pub use vhdl::VhdlScanner;

use hdlmap_common::{HdlResult, InternalError};
use hdlmap_diagnostics::{codes, Diagnostic, Label};
use hdlmap_source::{SourceEntry, Span};
use regex::Regex;

use crate::registry::ScannerRegistry;

/// Registers the scanner for every supported dialect.
pub fn register_builtin_scanners(registry: &mut ScannerRegistry) -> HdlResult<()> {
    registry.register(Box::new(ScalaScanner::chisel()?));
    registry.register(Box::new(ScalaScanner::spinal()?));
    registry.register(Box::new(BluespecScanner::new()?));
    registry.register(Box::new(VerilogScanner::system_verilog()?));
    registry.register(Box::new(VerilogScanner::verilog()?));
    registry.register(Box::new(VhdlScanner::new()?));
    Ok(())
}

/// Compiles a built-in pattern.
pub(crate) fn compile(pattern: &str) -> HdlResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| InternalError::new(format!("built-in pattern `{pattern}` is invalid: {e}")))
}

/// Returns `true` if the entry's extension is one of `exts`.
pub(crate) fn has_extension(entry: &SourceEntry, exts: &[&str]) -> bool {
    let ext = entry.extension();
    exts.iter().any(|e| *e == ext)
}

/// Builds the `W102` warning for a declaration without its end marker.
pub(crate) fn unterminated(kind: &str, name: &str, end_marker: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(
        codes::UNTERMINATED_DECL,
        format!("{kind} '{name}' has no matching `{end_marker}`"),
        span,
    )
    .with_label(Label::primary(span, "declared here"))
    .with_note("the declaration was recorded with its body running to the next declaration or end of file")
}

/// Finds the first match of `re` in `text` starting at or after `from`.
pub(crate) fn find_from(re: &Regex, text: &str, from: usize) -> Option<(usize, usize)> {
    if from > text.len() {
        return None;
    }
    re.find_at(text, from).map(|m| (m.start(), m.end()))
}
