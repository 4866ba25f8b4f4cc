//! Scanner for Scala-embedded HDLs (Chisel and SpinalHDL).
//!
//! A class is a module when it extends one of the flavor's hardware base
//! classes, or a class in the same file that does. Bundles become
//! interfaces. `new Name` inside a module body is an instantiation.

use std::collections::{BTreeMap, BTreeSet};

use hdlmap_common::{Dialect, HdlResult};
use hdlmap_source::{SourceEntry, SourceFile, Span};
use regex::Regex;

use super::{compile, has_extension, unterminated};
use crate::lexer::{blank, ident_at, skip_balanced, skip_ws, CommentSyntax};
use crate::model::{FileScan, Instantiation, Interface, Module, ModuleAttribute};
use crate::scanner::Scanner;

/// How a base class shapes the classes extending it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum BaseKind {
    Module,
    Blackbox,
    Tester,
    Bundle,
}

/// A class declaration found in one file.
struct ClassDecl {
    name: String,
    kw: usize,
    name_end: usize,
    parametric: bool,
    parent: Option<String>,
    body: Option<(usize, usize)>,
    unterminated: bool,
}

/// Scanner for `.scala` sources, configured for one flavor.
pub struct ScalaScanner {
    dialect: Dialect,
    bases: BTreeMap<&'static str, BaseKind>,
    class: Regex,
    new_instance: Regex,
    ports: Regex,
    simulation: Regex,
}

impl ScalaScanner {
    fn new(dialect: Dialect, bases: &[(&'static str, BaseKind)], ports: &str) -> HdlResult<Self> {
        Ok(Self {
            dialect,
            bases: bases.iter().copied().collect(),
            class: compile(r"\bclass\s+([A-Za-z_][A-Za-z0-9_]*)")?,
            new_instance: compile(r"\bnew\s+([A-Z][A-Za-z0-9_]*)")?,
            ports: compile(ports)?,
            simulation: compile(r"\bstop\s*\(\s*\)|\bassert\s*\(\s*false\s*\)")?,
        })
    }

    /// Creates the Chisel scanner.
    pub fn chisel() -> HdlResult<Self> {
        use BaseKind::*;
        Self::new(
            Dialect::Chisel,
            &[
                ("Module", Module),
                ("RawModule", Module),
                ("MultiIOModule", Module),
                ("LegacyModule", Module),
                ("LazyModule", Module),
                ("BlackBox", Blackbox),
                ("ExtModule", Blackbox),
                ("BasicTester", Tester),
                ("Bundle", Bundle),
                ("Record", Bundle),
            ],
            r"\bIO\s*\(|\bFlipped\s*\(|\bLazyModuleImp\b",
        )
    }

    /// Creates the SpinalHDL scanner.
    pub fn spinal() -> HdlResult<Self> {
        use BaseKind::*;
        Self::new(
            Dialect::SpinalHdl,
            &[
                ("Component", Module),
                ("BlackBox", Blackbox),
                ("Bundle", Bundle),
            ],
            r"\b(?:in|out|inout)\s*(?:\(|[A-Z])|\b(?:master|slave)\s*\(|\bnew\s+Bundle\b",
        )
    }

    /// Parses the declaration following `class Name`.
    fn parse_class(&self, text: &str, kw: usize, name_start: usize, name_end: usize, limit: usize) -> ClassDecl {
        let src = text.as_bytes();
        let mut i = skip_ws(src, name_end);
        let mut parametric = false;

        // Type parameters, then any number of constructor parameter lists.
        if src.get(i) == Some(&b'[') {
            if let Some(end) = skip_balanced(src, i, b'[', b']') {
                parametric = true;
                i = skip_ws(src, end);
            }
        }
        while src.get(i) == Some(&b'(') {
            match skip_balanced(src, i, b'(', b')') {
                Some(end) => {
                    if src[i + 1..end - 1].iter().any(|b| !b.is_ascii_whitespace()) {
                        parametric = true;
                    }
                    i = skip_ws(src, end);
                }
                None => break,
            }
        }

        let mut parent = None;
        if text[i..].starts_with("extends") {
            let j = skip_ws(src, i + "extends".len());
            // Qualified names keep their last segment: `chisel3.Module` -> `Module`.
            let mut k = j;
            let mut last = None;
            while let Some(end) = ident_at(src, k) {
                last = Some((k, end));
                if src.get(end) == Some(&b'.') {
                    k = end + 1;
                } else {
                    break;
                }
            }
            if let Some((s, e)) = last {
                parent = Some(text[s..e].to_string());
                i = e;
            }
        }

        // The body is the first `{` before the next class; a class without
        // one has an empty body.
        let body = text.get(i..limit).and_then(|s| s.find('{')).map(|p| i + p);
        let (body, unterminated) = match body {
            Some(open) => match skip_balanced(src, open, b'{', b'}') {
                Some(close) => (Some((open + 1, close - 1)), false),
                None => (Some((open + 1, src.len())), true),
            },
            None => (None, false),
        };

        ClassDecl {
            name: text[name_start..name_end].to_string(),
            kw,
            name_end,
            parametric,
            parent,
            body,
            unterminated,
        }
    }

    /// Resolves each class's base kind, following in-file inheritance.
    fn classify(&self, classes: &[ClassDecl]) -> Vec<Option<BaseKind>> {
        let by_name: BTreeMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), i))
            .collect();

        classes
            .iter()
            .map(|c| {
                let mut seen = BTreeSet::new();
                let mut parent = c.parent.as_deref();
                while let Some(p) = parent {
                    if let Some(kind) = self.bases.get(p) {
                        return Some(*kind);
                    }
                    if !seen.insert(p) {
                        return None;
                    }
                    parent = by_name.get(p).and_then(|&i| classes[i].parent.as_deref());
                }
                None
            })
            .collect()
    }
}

impl Scanner for ScalaScanner {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn accepts(&self, entry: &SourceEntry) -> bool {
        has_extension(entry, &["scala"])
    }

    fn scan_file(&self, file: &SourceFile) -> FileScan {
        let text = blank(&file.content, CommentSyntax::Scala);
        let mut scan = FileScan::default();

        let heads: Vec<(usize, usize, usize)> = self
            .class
            .captures_iter(&text)
            .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.start(), c.get(1)?.end())))
            .collect();

        let classes: Vec<ClassDecl> = heads
            .iter()
            .enumerate()
            .map(|(idx, &(kw, s, e))| {
                let limit = heads.get(idx + 1).map_or(text.len(), |h| h.0);
                self.parse_class(&text, kw, s, e, limit)
            })
            .collect();

        for (class, kind) in classes.iter().zip(self.classify(&classes)) {
            let Some(kind) = kind else { continue };
            if kind == BaseKind::Bundle {
                scan.interfaces.push(Interface {
                    name: class.name.clone(),
                    file: file.relative.clone(),
                });
                continue;
            }

            let span = Span::from_range(file.id, class.kw, class.name_end);
            let mut module = Module::new(class.name.clone(), file.relative.clone(), self.dialect, span);
            if class.parametric {
                module.attributes.insert(ModuleAttribute::Parametric);
            }
            match kind {
                BaseKind::Blackbox => {
                    module.attributes.insert(ModuleAttribute::Blackbox);
                }
                BaseKind::Tester => {
                    module.attributes.insert(ModuleAttribute::SimulationOnly);
                }
                BaseKind::Module | BaseKind::Bundle => {}
            }
            if class.unterminated {
                module.attributes.insert(ModuleAttribute::Unterminated);
                scan.diagnostics.push(unterminated("class", &class.name, "}", span));
            }

            let body = class.body.map_or("", |(s, e)| &text[s..e]);
            if !self.ports.is_match(body) {
                module.attributes.insert(ModuleAttribute::NoPorts);
            }
            if self.simulation.is_match(body) {
                module.attributes.insert(ModuleAttribute::SimulationOnly);
            }

            if let Some((offset, _)) = class.body {
                for c in self.new_instance.captures_iter(body) {
                    if let Some(child) = c.get(1).filter(|m| !self.bases.contains_key(m.as_str())) {
                        let (s, e) = (offset + child.start(), offset + child.end());
                        scan.instantiations.push(Instantiation {
                            parent: class.name.clone(),
                            parent_file: file.relative.clone(),
                            child: child.as_str().to_string(),
                            resolved: false,
                            span: Span::from_range(file.id, s, e),
                        });
                    }
                }
            }
            scan.modules.push(module);
        }

        scan
    }
}
