//! VHDL scanner.
//!
//! Entities are the modules. Architectures are scanned for instances and the
//! instances are attributed to the architecture's entity. Names keep their
//! declared spelling; case-insensitive resolution happens at project level.

use std::collections::BTreeSet;

use hdlmap_common::{Dialect, HdlResult};
use hdlmap_source::{SourceEntry, SourceFile, Span};
use regex::Regex;

use super::{compile, find_from, has_extension, unterminated};
use crate::lexer::{blank, CommentSyntax};
use crate::model::{
    FileScan, Instantiation, Module, ModuleAttribute, PackageDecl, PackageImport,
};
use crate::scanner::Scanner;

/// Scanner for `.vhd` and `.vhdl` sources.
pub struct VhdlScanner {
    entity: Regex,
    architecture: Regex,
    package: Regex,
    unit_start: Regex,
    use_work: Regex,
    entity_inst: Regex,
    component_inst: Regex,
    generic: Regex,
    port: Regex,
    simulation: Regex,
}

impl VhdlScanner {
    /// Creates the VHDL scanner.
    pub fn new() -> HdlResult<Self> {
        Ok(Self {
            entity: compile(r"(?i)\bentity\s+([a-z][a-z0-9_]*)\s+is\b")?,
            architecture: compile(r"(?i)\barchitecture\s+([a-z][a-z0-9_]*)\s+of\s+([a-z][a-z0-9_]*)\s+is\b")?,
            package: compile(r"(?i)\bpackage\s+([a-z][a-z0-9_]*)\s+is\b")?,
            unit_start: compile(r"(?i)\b(?:entity\s+[a-z][a-z0-9_]*\s+is|architecture\s+[a-z][a-z0-9_]*\s+of|package\s+(?:body\s+)?[a-z][a-z0-9_]*\s+is|configuration\s+[a-z][a-z0-9_]*\s+of)\b")?,
            use_work: compile(r"(?i)\buse\s+work\s*\.\s*([a-z][a-z0-9_]*)\s*\.")?,
            entity_inst: compile(r"(?i)\b[a-z][a-z0-9_]*\s*:\s*entity\s+(?:[a-z][a-z0-9_]*\s*\.\s*)?([a-z][a-z0-9_]*)")?,
            component_inst: compile(r"(?i)\b[a-z][a-z0-9_]*\s*:\s*(?:component\s+)?([a-z][a-z0-9_]*)\s+(?:generic|port)\s+map\b")?,
            generic: compile(r"(?i)\bgeneric\s*\(")?,
            port: compile(r"(?i)\bport\s*\(")?,
            simulation: compile(r"(?i)\bwait\s+for\b|\bstd\s*\.\s*env\s*\.\s*(?:stop|finish)\b|\bseverity\s+failure\b")?,
        })
    }

    /// Finds the end of a unit named `name` whose declaration ends at `from`,
    /// bounded by `limit`. Accepts `end;`, `end <kind>;`, `end <name>;` and
    /// `end <kind> <name>;`.
    fn unit_end(&self, text: &str, from: usize, limit: usize, kind: &str, name: &str) -> Option<usize> {
        let pattern = format!(
            r"(?i)\bend(?:\s+{kind})?(?:\s+{})?\s*;",
            regex::escape(name)
        );
        let re = compile(&pattern).ok()?;
        find_from(&re, text, from)
            .map(|(s, _)| s)
            .filter(|&s| s < limit)
    }
}

impl Scanner for VhdlScanner {
    fn dialect(&self) -> Dialect {
        Dialect::Vhdl
    }

    fn accepts(&self, entry: &SourceEntry) -> bool {
        has_extension(entry, &["vhd", "vhdl"])
    }

    fn scan_file(&self, file: &SourceFile) -> FileScan {
        let text = blank(&file.content, CommentSyntax::Vhdl);
        let mut scan = FileScan::default();

        let starts: Vec<usize> = self.unit_start.find_iter(&text).map(|m| m.start()).collect();
        let next_start = |after: usize| {
            starts
                .iter()
                .copied()
                .find(|&s| s > after)
                .unwrap_or(text.len())
        };

        for c in self.entity.captures_iter(&text) {
            let (Some(whole), Some(name)) = (c.get(0), c.get(1)) else {
                continue;
            };
            let span = Span::from_range(file.id, whole.start(), name.end());
            let limit = next_start(whole.start());
            let mut module = Module::new(name.as_str(), file.relative.clone(), Dialect::Vhdl, span);

            // An entity body holds only declarations, so a bare `end;` is safe here.
            let end = match self.unit_end(&text, whole.end(), limit, "entity", name.as_str()) {
                Some(e) => e,
                None => {
                    module.attributes.insert(ModuleAttribute::Unterminated);
                    scan.diagnostics.push(unterminated("entity", name.as_str(), "end entity", span));
                    limit
                }
            };
            let header = &text[whole.end()..end];
            if self.generic.is_match(header) {
                module.attributes.insert(ModuleAttribute::Parametric);
            }
            if !self.port.is_match(header) {
                module.attributes.insert(ModuleAttribute::NoPorts);
            }
            scan.modules.push(module);
        }

        for c in self.architecture.captures_iter(&text) {
            let (Some(whole), Some(arch), Some(entity)) = (c.get(0), c.get(1), c.get(2)) else {
                continue;
            };
            let limit = next_start(whole.start());
            // Processes and functions also close with `end ...;`, so only the
            // explicit forms end an architecture; otherwise the next unit does.
            let explicit = format!(
                r"(?i)\bend\s+(?:architecture\b(?:\s+{0})?|{0})\s*;",
                regex::escape(arch.as_str())
            );
            let end = compile(&explicit)
                .ok()
                .and_then(|re| find_from(&re, &text, whole.end()))
                .map(|(s, _)| s)
                .filter(|&s| s < limit)
                .unwrap_or(limit);
            let body = &text[whole.end()..end];

            if self.simulation.is_match(body) {
                let entity_name = entity.as_str();
                for m in scan
                    .modules
                    .iter_mut()
                    .filter(|m| m.name.eq_ignore_ascii_case(entity_name))
                {
                    m.attributes.insert(ModuleAttribute::SimulationOnly);
                }
            }

            let mut found: Vec<(usize, usize)> = Vec::new();
            for re in [&self.entity_inst, &self.component_inst] {
                for ic in re.captures_iter(body) {
                    if let Some(child) = ic.get(1) {
                        found.push((whole.end() + child.start(), whole.end() + child.end()));
                    }
                }
            }
            found.sort_unstable();
            found.dedup();
            for (s, e) in found {
                scan.instantiations.push(Instantiation {
                    parent: entity.as_str().to_string(),
                    parent_file: file.relative.clone(),
                    child: text[s..e].to_string(),
                    resolved: false,
                    span: Span::from_range(file.id, s, e),
                });
            }
        }

        for c in self.package.captures_iter(&text) {
            if let Some(name) = c.get(1) {
                if name.as_str().eq_ignore_ascii_case("body") {
                    continue;
                }
                scan.packages.push(PackageDecl {
                    name: name.as_str().to_string(),
                    file: file.relative.clone(),
                });
            }
        }

        let imported: BTreeSet<String> = self
            .use_work
            .captures_iter(&text)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();
        scan.imports.extend(imported.into_iter().map(|package| PackageImport {
            file: file.relative.clone(),
            package,
        }));

        scan
    }
}
