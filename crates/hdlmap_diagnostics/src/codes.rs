//! The fixed catalogue of codes emitted by the analysis pipeline.

use crate::code::{Category, DiagnosticCode};

/// A source file could not be read.
pub const UNREADABLE_FILE: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
/// No module declarations were found anywhere in the project.
pub const EMPTY_PROJECT: DiagnosticCode = DiagnosticCode::new(Category::Error, 201);
/// No candidate scored above the floor.
pub const NO_TOP_FOUND: DiagnosticCode = DiagnosticCode::new(Category::Error, 202);
/// The best candidates tied and strict tie handling is enabled.
pub const AMBIGUOUS_TOP: DiagnosticCode = DiagnosticCode::new(Category::Error, 203);
/// No writable location for a build descriptor or entry point.
pub const NOT_WRITABLE: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);
/// The compile collaborator reported failure.
pub const COMPILE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Error, 401);
/// The compile collaborator exceeded its timeout.
pub const COMPILE_TIMEOUT: DiagnosticCode = DiagnosticCode::new(Category::Error, 402);

/// A declaration is missing its end marker.
pub const UNTERMINATED_DECL: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);
/// The same module name is declared in more than one place.
pub const DUPLICATE_MODULE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 103);
/// Equal top scores were separated by the deterministic tie-break.
pub const TIE_BROKEN: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
/// Modules instantiate each other in a cycle.
pub const INSTANTIATION_CYCLE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 202);
/// Package detection was ambiguous and the default namespace was used.
pub const NAMESPACE_DEFAULTED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);

/// The top module was given explicitly instead of being scored.
pub const TOP_OVERRIDE: DiagnosticCode = DiagnosticCode::new(Category::Heuristic, 1);
/// A build descriptor had to be synthesized.
pub const DESCRIPTOR_SYNTHESIZED: DiagnosticCode = DiagnosticCode::new(Category::Heuristic, 2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_unique() {
        let all = [
            UNREADABLE_FILE,
            EMPTY_PROJECT,
            NO_TOP_FOUND,
            AMBIGUOUS_TOP,
            NOT_WRITABLE,
            COMPILE_FAILED,
            COMPILE_TIMEOUT,
            UNTERMINATED_DECL,
            DUPLICATE_MODULE,
            TIE_BROKEN,
            INSTANTIATION_CYCLE,
            NAMESPACE_DEFAULTED,
            TOP_OVERRIDE,
            DESCRIPTOR_SYNTHESIZED,
        ];
        let set: std::collections::BTreeSet<_> = all.iter().map(|c| c.to_string()).collect();
        assert_eq!(set.len(), all.len());
        assert!(set.contains("W301"));
        assert!(set.contains("H002"));
    }
}
