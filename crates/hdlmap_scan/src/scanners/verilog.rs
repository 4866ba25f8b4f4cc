//! Verilog-2005 and SystemVerilog scanner.

use std::collections::BTreeSet;

use hdlmap_common::{Dialect, HdlResult};
use hdlmap_source::{SourceEntry, SourceFile, Span};
use regex::Regex;

use super::{compile, find_from, has_extension, unterminated};
use crate::lexer::{
    blank, ident_at, is_ident_byte, skip_balanced, skip_ws, CommentSyntax,
};
use crate::model::{
    FileScan, IncludeRef, Instantiation, Interface, Module, ModuleAttribute, PackageDecl,
    PackageImport,
};
use crate::scanner::Scanner;

/// Words that can never be a module type or an instance name.
const KEYWORDS: &[&str] = &[
    "always", "always_comb", "always_ff", "always_latch", "and", "assert", "assign", "assume",
    "automatic", "begin", "bit", "break", "buf", "bufif0", "bufif1", "byte", "case", "casex",
    "casez", "class", "const", "continue", "cover", "default", "defparam", "disable", "do",
    "else", "end", "endcase", "endclass", "endfunction", "endgenerate", "endmodule",
    "endpackage", "endtask", "enum", "event", "export", "extern", "final", "for", "force",
    "foreach", "forever", "fork", "function", "generate", "genvar", "if", "iff", "import",
    "initial", "inout", "input", "int", "integer", "interface", "join", "join_any",
    "join_none", "localparam", "logic", "longint", "macromodule", "modport", "module", "nand",
    "negedge", "new", "nor", "not", "notif0", "notif1", "or", "output", "package", "packed",
    "parameter", "posedge", "priority", "property", "pulldown", "pullup", "rand", "real",
    "realtime", "reg", "release", "repeat", "return", "sequence", "shortint", "signed",
    "specify", "static", "string", "struct", "super", "supply0", "supply1", "task", "this",
    "time", "tri", "tri0", "tri1", "triand", "trior", "type", "typedef", "union", "unique",
    "unique0", "unsigned", "var", "virtual", "void", "wait", "wand", "while", "wire", "wor",
    "xnor", "xor",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Scanner for `.v` and `.sv` sources.
///
/// In a SystemVerilog project `.v` files are scanned too, since SV projects
/// commonly mix both extensions.
pub struct VerilogScanner {
    dialect: Dialect,
    decl: Regex,
    end: Regex,
    interface: Regex,
    end_interface: Regex,
    package: Regex,
    import: Regex,
    include: Regex,
    simulation: Regex,
}

impl VerilogScanner {
    fn new(dialect: Dialect) -> HdlResult<Self> {
        Ok(Self {
            dialect,
            decl: compile(r"\b(?:module|macromodule)\s+(?:(?:automatic|static)\s+)?([A-Za-z_][A-Za-z0-9_$]*)")?,
            end: compile(r"\bendmodule\b")?,
            interface: compile(r"\binterface\s+(?:(?:automatic|static)\s+)?([A-Za-z_][A-Za-z0-9_$]*)")?,
            end_interface: compile(r"\bendinterface\b")?,
            package: compile(r"\bpackage\s+(?:(?:automatic|static)\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*;")?,
            import: compile(r"\bimport\s+([A-Za-z_][A-Za-z0-9_]*)\s*::")?,
            include: compile(r#"`include\s+"([^"]+)""#)?,
            simulation: compile(r"\$(?:finish|stop|dumpfile|dumpvars)\b|\bforever\b")?,
        })
    }

    /// Creates the Verilog-2005 scanner.
    pub fn verilog() -> HdlResult<Self> {
        Self::new(Dialect::Verilog)
    }

    /// Creates the SystemVerilog scanner.
    pub fn system_verilog() -> HdlResult<Self> {
        Self::new(Dialect::SystemVerilog)
    }
}

/// Returns `true` if the word before `pos` is `word`.
fn preceded_by(text: &str, pos: usize, word: &str) -> bool {
    text[..pos].trim_end().ends_with(word)
        && text[..pos]
            .trim_end()
            .strip_suffix(word)
            .and_then(|rest| rest.bytes().last())
            .map_or(true, |b| !is_ident_byte(b))
}

/// Parses the header after a module name. Returns the header end and whether
/// a parameter list and a non-empty port list were found.
fn parse_header(src: &[u8], name_end: usize, limit: usize) -> (usize, bool, bool) {
    let mut i = skip_ws(src, name_end);
    let mut parametric = false;
    let mut has_ports = false;

    // `module m import p::*; #(...)`
    while let Some(end) = ident_at(src, i) {
        if &src[i..end] != b"import" {
            break;
        }
        match src[end..limit].iter().position(|&b| b == b';') {
            Some(p) => i = skip_ws(src, end + p + 1),
            None => return (limit, parametric, has_ports),
        }
    }

    if src.get(i) == Some(&b'#') {
        let j = skip_ws(src, i + 1);
        if let Some(end) = skip_balanced(src, j, b'(', b')').filter(|&e| e <= limit) {
            parametric = true;
            i = skip_ws(src, end);
        }
    }

    if src.get(i) == Some(&b'(') {
        if let Some(end) = skip_balanced(src, i, b'(', b')').filter(|&e| e <= limit) {
            has_ports = src[i + 1..end - 1].iter().any(|b| !b.is_ascii_whitespace());
            i = end;
        }
    }

    let header_end = src[i..limit]
        .iter()
        .position(|&b| b == b';')
        .map_or(i, |p| i + p + 1);
    (header_end, parametric, has_ports)
}

/// Tries to read `[#(...)] inst [range]* (` after a type name ending at `i`.
fn instance_after(src: &[u8], i: usize, limit: usize) -> bool {
    let mut i = skip_ws(src, i);
    if src.get(i) == Some(&b'#') {
        i = skip_ws(src, i + 1);
        match skip_balanced(src, i, b'(', b')') {
            Some(end) if end <= limit => i = skip_ws(src, end),
            _ => return false,
        }
    }
    let Some(name_end) = ident_at(src, i) else {
        return false;
    };
    let Ok(name) = std::str::from_utf8(&src[i..name_end]) else {
        return false;
    };
    if is_keyword(name) {
        return false;
    }
    i = skip_ws(src, name_end);
    while src.get(i) == Some(&b'[') {
        match skip_balanced(src, i, b'[', b']') {
            Some(end) if end <= limit => i = skip_ws(src, end),
            _ => return false,
        }
    }
    i < limit && src[i] == b'('
}

/// Finds `Type [#(..)] inst (` statements in `src[from..to]`.
fn find_instances(text: &str, from: usize, to: usize) -> Vec<(usize, usize)> {
    let src = text.as_bytes();
    let mut found = Vec::new();
    let mut i = from;

    while i < to {
        let b = src[i];
        let boundary = i == 0
            || !(is_ident_byte(src[i - 1]) || matches!(src[i - 1], b'.' | b'`' | b'\'' | b'\\'));
        if !boundary || !(b.is_ascii_alphabetic() || b == b'_') {
            i += 1;
            continue;
        }
        let Some(end) = ident_at(src, i) else {
            i += 1;
            continue;
        };
        let word = &text[i..end];
        match word {
            // Function and task bodies contain calls, not instances.
            "function" | "task" => {
                let close = if word == "function" { "endfunction" } else { "endtask" };
                i = text[end..to].find(close).map_or(to, |p| end + p + close.len());
                continue;
            }
            _ if is_keyword(word) => {}
            _ => {
                if instance_after(src, end, to) {
                    found.push((i, end));
                }
            }
        }
        i = end;
    }
    found
}

impl Scanner for VerilogScanner {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn accepts(&self, entry: &SourceEntry) -> bool {
        match self.dialect {
            Dialect::SystemVerilog => has_extension(entry, &["sv", "v"]),
            _ => has_extension(entry, &["v"]),
        }
    }

    fn scan_file(&self, file: &SourceFile) -> FileScan {
        let text = blank(&file.content, CommentSyntax::CStyle);
        let src = text.as_bytes();
        let mut scan = FileScan::default();

        let decls: Vec<(usize, usize, usize)> = self
            .decl
            .captures_iter(&text)
            .filter_map(|c| {
                let whole = c.get(0)?;
                let name = c.get(1)?;
                (!preceded_by(&text, whole.start(), "extern"))
                    .then_some((whole.start(), name.start(), name.end()))
            })
            .collect();

        let interfaces: Vec<(usize, usize, usize)> = self
            .interface
            .captures_iter(&text)
            .filter_map(|c| {
                let whole = c.get(0)?;
                let name = c.get(1)?;
                let ok = &text[name.range()] != "class" && !preceded_by(&text, whole.start(), "virtual");
                ok.then_some((whole.start(), name.start(), name.end()))
            })
            .collect();

        let mut starts: Vec<usize> = decls.iter().chain(&interfaces).map(|d| d.0).collect();
        starts.sort_unstable();
        let next_start = |after: usize| starts.iter().copied().find(|&s| s > after);

        for &(kw, name_start, name_end) in &decls {
            let name = &text[name_start..name_end];
            let span = Span::from_range(file.id, kw, name_end);
            let limit = next_start(kw).unwrap_or(src.len());
            let end = find_from(&self.end, &text, name_end).filter(|&(s, _)| s < limit);

            let mut module = Module::new(name, file.relative.clone(), self.dialect, span);
            let body_end = match end {
                Some((s, _)) => s,
                None => {
                    module.attributes.insert(ModuleAttribute::Unterminated);
                    scan.diagnostics
                        .push(unterminated("module", name, "endmodule", span));
                    limit
                }
            };

            let (header_end, parametric, has_ports) = parse_header(src, name_end, body_end);
            if parametric {
                module.attributes.insert(ModuleAttribute::Parametric);
            }
            if !has_ports {
                module.attributes.insert(ModuleAttribute::NoPorts);
            }
            let body = &text[header_end.min(body_end)..body_end];
            if self.simulation.is_match(body) {
                module.attributes.insert(ModuleAttribute::SimulationOnly);
            }

            for (s, e) in find_instances(&text, header_end.min(body_end), body_end) {
                scan.instantiations.push(Instantiation {
                    parent: name.to_string(),
                    parent_file: file.relative.clone(),
                    child: text[s..e].to_string(),
                    resolved: false,
                    span: Span::from_range(file.id, s, e),
                });
            }
            scan.modules.push(module);
        }

        for &(kw, name_start, name_end) in &interfaces {
            let name = &text[name_start..name_end];
            let limit = next_start(kw).unwrap_or(src.len());
            if find_from(&self.end_interface, &text, name_end).map_or(true, |(s, _)| s >= limit) {
                let span = Span::from_range(file.id, kw, name_end);
                scan.diagnostics
                    .push(unterminated("interface", name, "endinterface", span));
            }
            scan.interfaces.push(Interface {
                name: name.to_string(),
                file: file.relative.clone(),
            });
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

        // Include targets live in strings, which blanking removed; read them
        // from the original text but only where the directive itself survived.
        for c in self.include.captures_iter(&file.content) {
            let (Some(whole), Some(target)) = (c.get(0), c.get(1)) else {
                continue;
            };
            if src.get(whole.start()) == Some(&b'`') {
                scan.includes.push(IncludeRef {
                    file: file.relative.clone(),
                    target: target.as_str().to_string(),
                });
            }
        }

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
            PathBuf::from("/repo/rtl/x.sv"),
            "rtl/x.sv".to_string(),
            src.to_string(),
        );
        VerilogScanner::system_verilog().unwrap().scan_file(&file)
    }

    fn children(scan: &FileScan, parent: &str) -> Vec<String> {
        scan.instantiations
            .iter()
            .filter(|i| i.parent == parent)
            .map(|i| i.child.clone())
            .collect()
    }

    #[test]
    fn modules_and_instances() {
        let scan = scan(
            r#"
module alu #(parameter W = 32) (input [W-1:0] a, output [W-1:0] y);
  assign y = a;
endmodule

module core(input clk);
  wire [31:0] x;
  alu #(.W(32)) u_alu (.a(x), .y());
  regfile rf [1:0] (.clk(clk));
  always @(posedge clk) begin
    if (x) foo(x);
  end
endmodule
"#,
        );
        let names: Vec<_> = scan.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["alu", "core"]);
        assert!(scan.modules[0].has(ModuleAttribute::Parametric));
        assert!(!scan.modules[1].has(ModuleAttribute::NoPorts));
        assert_eq!(children(&scan, "core"), vec!["alu", "regfile"]);
        assert!(scan.diagnostics.is_empty());
    }

    #[test]
    fn commented_out_declarations_are_ignored() {
        let scan = scan("// module ghost(input a); endmodule\n/* module ghost2; */\nmodule real_one(input a);\nendmodule\n");
        assert_eq!(scan.modules.len(), 1);
        assert_eq!(scan.modules[0].name, "real_one");
    }

    #[test]
    fn testbench_attributes() {
        let scan = scan(
            "module tb;\n  reg clk;\n  core dut(.clk(clk));\n  initial begin\n    #100 $finish;\n  end\nendmodule\n",
        );
        let tb = &scan.modules[0];
        assert!(tb.has(ModuleAttribute::NoPorts));
        assert!(tb.has(ModuleAttribute::SimulationOnly));
        assert_eq!(children(&scan, "tb"), vec!["core"]);
    }

    #[test]
    fn unterminated_module_is_recorded() {
        let scan = scan("module broken(input a);\n  sub s0(.a(a));\nmodule next_one(input b);\nendmodule\n");
        assert_eq!(scan.modules.len(), 2);
        assert!(scan.modules[0].has(ModuleAttribute::Unterminated));
        assert!(!scan.modules[1].has(ModuleAttribute::Unterminated));
        assert_eq!(children(&scan, "broken"), vec!["sub"]);
        assert_eq!(scan.diagnostics.len(), 1);
        assert_eq!(scan.diagnostics[0].code.to_string(), "W102");
    }

    #[test]
    fn unterminated_at_eof() {
        let scan = scan("module cut(input a);\n  assign");
        assert_eq!(scan.modules.len(), 1);
        assert!(scan.modules[0].has(ModuleAttribute::Unterminated));
    }

    #[test]
    fn function_calls_are_not_instances() {
        let scan = scan(
            "module m(input a);\n  function my_t f(input x);\n    g h(x);\n  endfunction\n  child c0(a);\nendmodule\n",
        );
        assert_eq!(children(&scan, "m"), vec!["child"]);
    }

    #[test]
    fn sv_interfaces_packages_imports_includes() {
        let scan = scan(
            r#"`include "defs.svh"
// `include "ignored.svh"
package core_pkg;
  typedef logic [31:0] word_t;
endpackage
interface bus_if(input clk);
  logic valid;
endinterface
module top import core_pkg::*; (input clk);
  bus_if b(clk);
endmodule
"#,
        );
        assert_eq!(scan.packages[0].name, "core_pkg");
        assert_eq!(scan.interfaces[0].name, "bus_if");
        assert_eq!(scan.imports.len(), 1);
        assert_eq!(scan.imports[0].package, "core_pkg");
        assert_eq!(scan.includes.len(), 1);
        assert_eq!(scan.includes[0].target, "defs.svh");
        assert_eq!(scan.modules.len(), 1);
        assert_eq!(children(&scan, "top"), vec!["bus_if"]);
    }

    #[test]
    fn virtual_interface_is_not_a_declaration() {
        let scan = scan("module m(input a);\n  virtual interface bus_if vif;\nendmodule\n");
        assert!(scan.interfaces.is_empty());
    }

    #[test]
    fn gate_primitives_are_not_instances() {
        let scan = scan("module g(input a, b, output y);\n  and g1(y, a, b);\n  nand #1 g2(y, a, b);\nendmodule\n");
        assert!(scan.instantiations.is_empty());
    }

    #[test]
    fn accepts_extensions() {
        let sv = VerilogScanner::system_verilog().unwrap();
        let v = VerilogScanner::verilog().unwrap();
        let entry = |p: &str| SourceEntry {
            path: PathBuf::from(p),
            relative: p.to_string(),
        };
        assert!(sv.accepts(&entry("a.v")));
        assert!(sv.accepts(&entry("a.sv")));
        assert!(v.accepts(&entry("a.v")));
        assert!(!v.accepts(&entry("a.sv")));
        assert!(!v.accepts(&entry("a.vhd")));
    }
}
