//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Problems that stop a project from producing a configuration, prefixed `E`.
    Error,
    /// Suspicious input that analysis worked around, prefixed `W`.
    Warning,
    /// Records of heuristic decisions worth surfacing, prefixed `H`.
    Heuristic,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Heuristic => 'H',
        }
    }
}

/// A category prefix plus a numeric identifier, displayed as e.g. `E201`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        assert_eq!(DiagnosticCode::new(Category::Error, 101).to_string(), "E101");
        assert_eq!(DiagnosticCode::new(Category::Warning, 3).to_string(), "W003");
        assert_eq!(DiagnosticCode::new(Category::Heuristic, 1).to_string(), "H001");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Heuristic, 2);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
