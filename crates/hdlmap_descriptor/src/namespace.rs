//! Scala package (namespace) detection.

use hdlmap_scan::lexer::{blank, CommentSyntax};

/// The namespace a Scala file declares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Namespace {
    /// No package clause.
    Root,
    /// Exactly one package clause.
    Named(String),
    /// Several package clauses; holds the full chained package.
    Chained(String),
}

impl Namespace {
    /// The package to declare generated code in, if any.
    pub fn declared(&self) -> Option<&str> {
        match self {
            Namespace::Root => None,
            Namespace::Named(n) | Namespace::Chained(n) => Some(n),
        }
    }
}

/// Reads the package clauses of a Scala source.
///
/// `package object` declarations are not namespace clauses and are ignored.
pub fn detect_namespace(text: &str) -> Namespace {
    let blanked = blank(text, CommentSyntax::Scala);
    let mut clauses: Vec<String> = Vec::new();

    for line in blanked.lines() {
        let Some(rest) = line.trim_start().strip_prefix("package") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let name: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
            .collect();
        if name.is_empty() || name == "object" {
            continue;
        }
        clauses.push(name);
    }

    match clauses.len() {
        0 => Namespace::Root,
        1 => Namespace::Named(clauses.remove(0)),
        _ => Namespace::Chained(clauses.join(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_clause() {
        let ns = detect_namespace("// package fake\npackage riscv.core\n\nimport chisel3._\n");
        assert_eq!(ns, Namespace::Named("riscv.core".to_string()));
        assert_eq!(ns.declared(), Some("riscv.core"));
    }

    #[test]
    fn no_clause() {
        assert_eq!(detect_namespace("import chisel3._\nclass Top extends Module {}"), Namespace::Root);
        assert_eq!(Namespace::Root.declared(), None);
    }

    #[test]
    fn chained_clauses() {
        let ns = detect_namespace("package freechips\npackage rocketchip\n\npackage object util {}\n");
        assert_eq!(ns, Namespace::Chained("freechips.rocketchip".to_string()));
    }

    #[test]
    fn identifiers_starting_with_package_are_ignored() {
        assert_eq!(detect_namespace("packageName := \"x\"\n"), Namespace::Root);
    }
}
