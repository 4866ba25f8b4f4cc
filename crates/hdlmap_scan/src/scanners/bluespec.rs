//! Bluespec SystemVerilog scanner.

use std::collections::BTreeSet;

use hdlmap_common::{Dialect, HdlResult};
use hdlmap_source::{SourceEntry, SourceFile, Span};
use regex::Regex;

use super::{compile, find_from, has_extension, unterminated};
use crate::lexer::{blank, ident_at, skip_balanced, skip_ws, CommentSyntax};
use crate::model::{
    FileScan, Instantiation, Interface, Module, ModuleAttribute, PackageDecl, PackageImport,
};
use crate::scanner::Scanner;

/// Scanner for `.bsv` sources.
pub struct BluespecScanner {
    synthesize: Regex,
    decl: Regex,
    end: Regex,
    bind: Regex,
    interface: Regex,
    package: Regex,
    import: Regex,
    simulation: Regex,
}

impl BluespecScanner {
    /// Creates the Bluespec scanner.
    pub fn new() -> HdlResult<Self> {
        Ok(Self {
            synthesize: compile(r"\(\*\s*synthesize\b[^*]*\*\)")?,
            decl: compile(r"\bmodule\s*(?:\[[^\]]*\]\s*)?([A-Za-z_][A-Za-z0-9_]*)")?,
            end: compile(r"\bendmodule\b")?,
            bind: compile(r"<-\s*([A-Za-z_][A-Za-z0-9_]*)")?,
            interface: compile(r"\binterface\s+([A-Z][A-Za-z0-9_]*)\s*(?:#\s*\([^;]*\))?\s*;")?,
            package: compile(r"\bpackage\s+([A-Za-z_][A-Za-z0-9_]*)\s*;")?,
            import: compile(r"\bimport\s+([A-Za-z_][A-Za-z0-9_]*)\s*::")?,
            simulation: compile(r"\$(?:finish|dumpvars|dumpfile)\b")?,
        })
    }
}

/// Reads `[#(params)] (Ifc ...)` after a module name.
///
/// Returns (parametric, interface type name if any).
fn parse_header(src: &[u8], name_end: usize, limit: usize) -> (bool, Option<String>) {
    let mut i = skip_ws(src, name_end);
    let mut parametric = false;
    if src.get(i) == Some(&b'#') {
        let j = skip_ws(src, i + 1);
        if let Some(end) = skip_balanced(src, j, b'(', b')').filter(|&e| e <= limit) {
            parametric = true;
            i = skip_ws(src, end);
        }
    }
    if src.get(i) != Some(&b'(') {
        return (parametric, None);
    }
    let inner = skip_ws(src, i + 1);
    let ifc = ident_at(src, inner)
        .filter(|&e| e <= limit)
        .and_then(|e| std::str::from_utf8(&src[inner..e]).ok())
        .map(str::to_string);
    (parametric, ifc)
}

impl Scanner for BluespecScanner {
    fn dialect(&self) -> Dialect {
        Dialect::Bluespec
    }

    fn accepts(&self, entry: &SourceEntry) -> bool {
        has_extension(entry, &["bsv"])
    }

    fn scan_file(&self, file: &SourceFile) -> FileScan {
        let text = blank(&file.content, CommentSyntax::CStyle);
        let src = text.as_bytes();
        let mut scan = FileScan::default();

        let attrs: Vec<usize> = self.synthesize.find_iter(&text).map(|m| m.start()).collect();
        let decls: Vec<(usize, usize, usize)> = self
            .decl
            .captures_iter(&text)
            .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.start(), c.get(1)?.end())))
            .collect();

        let mut bodies: Vec<(usize, usize)> = Vec::new();

        for (idx, &(kw, name_start, name_end)) in decls.iter().enumerate() {
            let name = &text[name_start..name_end];
            let span = Span::from_range(file.id, kw, name_end);
            let limit = decls.get(idx + 1).map_or(src.len(), |d| d.0);
            let mut module = Module::new(name, file.relative.clone(), Dialect::Bluespec, span);

            let body_end = match find_from(&self.end, &text, name_end).filter(|&(s, _)| s < limit) {
                Some((s, _)) => s,
                None => {
                    module.attributes.insert(ModuleAttribute::Unterminated);
                    scan.diagnostics.push(unterminated("module", name, "endmodule", span));
                    limit
                }
            };

            let attr_floor = bodies.last().map_or(0, |b| b.1);
            if attrs.iter().any(|&a| a >= attr_floor && a < kw) {
                module.attributes.insert(ModuleAttribute::Synthesize);
            }

            let (parametric, ifc) = parse_header(src, name_end, body_end);
            if parametric {
                module.attributes.insert(ModuleAttribute::Parametric);
            }
            match ifc.as_deref() {
                None => {
                    module.attributes.insert(ModuleAttribute::NoPorts);
                }
                Some("Empty") => {
                    module.attributes.insert(ModuleAttribute::EmptyInterface);
                    module.attributes.insert(ModuleAttribute::NoPorts);
                }
                Some(_) => {}
            }

            let body = &text[name_end..body_end];
            if self.simulation.is_match(body) {
                module.attributes.insert(ModuleAttribute::SimulationOnly);
            }

            for c in self.bind.captures_iter(body) {
                if let Some(child) = c.get(1) {
                    let (s, e) = (name_end + child.start(), name_end + child.end());
                    scan.instantiations.push(Instantiation {
                        parent: name.to_string(),
                        parent_file: file.relative.clone(),
                        child: child.as_str().to_string(),
                        resolved: false,
                        span: Span::from_range(file.id, s, e),
                    });
                }
            }

            bodies.push((kw, body_end));
            scan.modules.push(module);
        }

        // Module bodies also contain `interface Ifc name;` definitions; only
        // top-level declarations count.
        for c in self.interface.captures_iter(&text) {
            let (Some(whole), Some(name)) = (c.get(0), c.get(1)) else {
                continue;
            };
            let inside = bodies
                .iter()
                .any(|&(s, e)| whole.start() > s && whole.start() < e);
            if !inside {
                scan.interfaces.push(Interface {
                    name: name.as_str().to_string(),
                    file: file.relative.clone(),
                });
            }
        }

        for c in self.package.captures_iter(&text) {
            if let Some(name) = c.get(1) {
                scan.packages.push(PackageDecl {
                    name: name.as_str().to_string(),
                    file: file.relative.clone(),
                });
            }
        }

        let imported: BTreeSet<&str> = self
            .import
            .captures_iter(&text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        scan.imports.extend(imported.into_iter().map(|p| PackageImport {
            file: file.relative.clone(),
            package: p.to_string(),
        }));

        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdlmap_source::FileId;
    use std::path::PathBuf;

    fn scan(src: &str) -> FileScan {
        let file = SourceFile::new(
            FileId::from_raw(0),
            PathBuf::from("/repo/src/Core.bsv"),
            "src/Core.bsv".to_string(),
            src.to_string(),
        );
        BluespecScanner::new().unwrap().scan_file(&file)
    }

    #[test]
    fn modules_synthesize_and_bindings() {
        let scan = scan(
            r#"
package Core;
import FIFO::*;
import ALU::*;

interface Core_IFC;
  method Action start;
endinterface

module mkALU(ALU_IFC);
endmodule

(* synthesize *)
module mkCore(Core_IFC);
  ALU_IFC alu <- mkALU;
  RegFile_IFC rf <- mkRegFile();
  FIFO#(Bit#(32)) q <- mkFIFO;
  interface Core_IFC ifc;
  endinterface
endmodule
endpackage
"#,
        );
        let names: Vec<_> = scan.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["mkALU", "mkCore"]);
        assert!(!scan.modules[0].has(ModuleAttribute::Synthesize));
        assert!(scan.modules[1].has(ModuleAttribute::Synthesize));

        let children: Vec<_> = scan
            .instantiations
            .iter()
            .filter(|i| i.parent == "mkCore")
            .map(|i| i.child.as_str())
            .collect();
        assert_eq!(children, vec!["mkALU", "mkRegFile", "mkFIFO"]);

        assert_eq!(scan.interfaces.len(), 1);
        assert_eq!(scan.interfaces[0].name, "Core_IFC");
        assert_eq!(scan.packages[0].name, "Core");
        let imports: Vec<_> = scan.imports.iter().map(|i| i.package.as_str()).collect();
        assert_eq!(imports, vec!["ALU", "FIFO"]);
    }

    #[test]
    fn empty_interface_testbench() {
        let scan = scan("module mkTb(Empty);\n  Core_IFC c <- mkCore;\n  rule done; $finish(0); endrule\nendmodule\n");
        let tb = &scan.modules[0];
        assert!(tb.has(ModuleAttribute::EmptyInterface));
        assert!(tb.has(ModuleAttribute::NoPorts));
        assert!(tb.has(ModuleAttribute::SimulationOnly));
    }

    #[test]
    fn parametric_module() {
        let scan = scan("module mkCache#(Integer ways)(Cache_IFC);\nendmodule\n");
        assert!(scan.modules[0].has(ModuleAttribute::Parametric));
        assert!(!scan.modules[0].has(ModuleAttribute::NoPorts));
    }

    #[test]
    fn unterminated_module() {
        let scan = scan("(* synthesize *)\nmodule mkHalf(Ifc);\n  X x <- mkX;\n");
        assert!(scan.modules[0].has(ModuleAttribute::Unterminated));
        assert!(scan.modules[0].has(ModuleAttribute::Synthesize));
        assert_eq!(scan.instantiations.len(), 1);
        assert_eq!(scan.diagnostics.len(), 1);
    }
}
