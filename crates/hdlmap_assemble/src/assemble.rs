//! Derivation of the [`ConfigDescriptor`] from a resolved project.

use std::collections::{BTreeMap, BTreeSet};

use hdlmap_common::Dialect;
use hdlmap_config::{ResolverConfig, ToolchainConfig};
use hdlmap_descriptor::{BuildDescriptor, EntryPoint};
use hdlmap_graph::DependencyGraph;
use hdlmap_resolve::{snake_case, ResolveError, ResolvedTop};
use hdlmap_scan::{ModuleAttribute, ProjectScan};
use hdlmap_source::SourceDb;
use regex::Regex;

use crate::descriptor::{ConfigDescriptor, ModuleEntry};

/// Used when the resolver tables carry no rule named `testbench`.
const TESTBENCH_PATTERN: &str = r"(^|_)(tb|test|testbench|bench|sim)\d*($|_)";
const MARCH_PATTERN: &str = r"(?i)\brv(32|64)[a-z]+\b";
const IMEM_PATTERN: &str = r"(?i)\b(imem|i_mem|instr_?mem|instruction_?mem|ibus|i_bus|inst_?ram|rom_(addr|data))\w*";
const DMEM_PATTERN: &str = r"(?i)\b(dmem|d_mem|data_?mem|dbus|d_bus|data_?ram|ram_(addr|data))\w*";

/// Everything the assembler reads. Nothing here is modified.
pub struct AssembleInput<'a> {
    /// Project name.
    pub name: &'a str,
    /// Root directory name.
    pub folder: &'a str,
    /// Repository URL.
    pub repository: Option<&'a str>,
    /// The merged scan.
    pub scan: &'a ProjectScan,
    /// The instantiation graph built from `scan`.
    pub graph: &'a DependencyGraph,
    /// Loaded file contents, used for the ISA and memory-port sniffing.
    pub db: &'a SourceDb,
    /// The chosen top.
    pub top: &'a ResolvedTop,
    /// Toolchain settings for the project dialect.
    pub toolchain: &'a ToolchainConfig,
    /// Build descriptor (namespace dialects).
    pub descriptor: Option<&'a BuildDescriptor>,
    /// Entry point (namespace dialects).
    pub entry: Option<&'a EntryPoint>,
}

/// Builds configuration descriptors.
///
/// Assembly is a pure function of its input: the same scan, graph and top
/// always give the same descriptor.
pub struct Assembler {
    testbench: Regex,
    march: Regex,
    imem: Regex,
    dmem: Regex,
    default_march: String,
}

impl Assembler {
    /// Creates an assembler that recognizes testbenches with the resolver's
    /// `testbench` rule.
    pub fn new(resolver: &ResolverConfig, default_march: impl Into<String>) -> Result<Self, ResolveError> {
        let (name, pattern) = resolver
            .rules
            .iter()
            .find(|r| r.name == "testbench")
            .map_or(("testbench", TESTBENCH_PATTERN), |r| (r.name.as_str(), r.pattern.as_str()));
        let compile = |name: &str, pattern: &str| {
            Regex::new(pattern).map_err(|source| ResolveError::InvalidRule {
                name: name.to_string(),
                source,
            })
        };
        Ok(Self {
            testbench: compile(name, pattern)?,
            march: compile("march", MARCH_PATTERN)?,
            imem: compile("imem", IMEM_PATTERN)?,
            dmem: compile("dmem", DMEM_PATTERN)?,
            default_march: default_march.into(),
        })
    }

    /// Assembles the descriptor for `input`.
    pub fn assemble(&self, input: &AssembleInput<'_>) -> ConfigDescriptor {
        let scan = input.scan;
        let dialect = scan.dialect;
        let files = selected_files(input);
        let sim_files = self.sim_files(scan, &files);
        let include_dirs = include_dirs(scan, &files);

        let interfaces: Vec<String> = scan
            .interfaces
            .iter()
            .map(|i| i.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let modules = sorted_modules(scan);

        let top_is_blackbox = scan
            .modules
            .iter()
            .any(|m| m.name == input.top.module && m.file == input.top.declaring_file && m.has(ModuleAttribute::Blackbox));
        let is_simulable = !top_is_blackbox && (!dialect.is_namespace_based() || input.entry.is_some());

        let mut descriptor = ConfigDescriptor {
            name: input.name.to_string(),
            folder: input.folder.to_string(),
            repository: input.repository.map(str::to_string),
            language: dialect.tag().to_string(),
            top_module: input.top.module.clone(),
            files,
            sim_files,
            include_dirs,
            interfaces,
            modules,
            is_simulable,
            march: None,
            two_memory: None,
            extra_flags: None,
            language_version: None,
            build_sbt: None,
            main_app: None,
            namespace: None,
        };

        if dialect.is_namespace_based() {
            descriptor.build_sbt = input.descriptor.map(|d| d.relative.clone());
            descriptor.main_app = input.entry.map(|e| e.relative.clone());
            descriptor.namespace = input.entry.and_then(|e| e.namespace.clone());
        } else {
            descriptor.march = Some(self.march(input.db, &descriptor.files));
            descriptor.two_memory = Some(self.two_memory(input.db, &input.top.declaring_file));
            descriptor.extra_flags = Some(input.toolchain.extra_flags.clone());
            descriptor.language_version = language_version(dialect).map(str::to_string);
        }

        tracing::debug!(
            top = %descriptor.top_module,
            files = descriptor.files.len(),
            sim_files = descriptor.sim_files.len(),
            "assembled descriptor"
        );
        descriptor
    }

    fn sim_files(&self, scan: &ProjectScan, files: &[String]) -> Vec<String> {
        let selected: BTreeSet<&str> = files.iter().map(String::as_str).collect();
        scan.modules
            .iter()
            .filter(|m| !selected.contains(m.file.as_str()))
            .filter(|m| m.has(ModuleAttribute::SimulationOnly) || self.testbench.is_match(&snake_case(&m.name)))
            .map(|m| m.file.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The most frequent ISA string in `files`, ties going to the
    /// lexicographically smallest.
    fn march(&self, db: &SourceDb, files: &[String]) -> String {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for file in files {
            let Some(source) = db.find_relative(file) else {
                continue;
            };
            for m in self.march.find_iter(&source.content) {
                *counts.entry(m.as_str().to_ascii_lowercase()).or_default() += 1;
            }
        }
        let mut best: Option<(&String, usize)> = None;
        for (isa, &n) in &counts {
            if best.map_or(true, |(_, b)| n > b) {
                best = Some((isa, n));
            }
        }
        best.map_or_else(|| self.default_march.clone(), |(isa, _)| isa.clone())
    }

    fn two_memory(&self, db: &SourceDb, top_file: &str) -> bool {
        db.find_relative(top_file)
            .is_some_and(|f| self.imem.is_match(&f.content) && self.dmem.is_match(&f.content))
    }
}

fn language_version(dialect: Dialect) -> Option<&'static str> {
    match dialect {
        Dialect::Verilog => Some("2005"),
        Dialect::SystemVerilog => Some("2017"),
        Dialect::Vhdl => Some("08"),
        Dialect::Bluespec => Some("bsc"),
        Dialect::Chisel | Dialect::SpinalHdl => None,
    }
}

/// Every (file, name) pair in that order.
fn sorted_modules(scan: &ProjectScan) -> Vec<ModuleEntry> {
    scan.modules
        .iter()
        .map(|m| (m.file.clone(), m.name.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|(file, module)| ModuleEntry { module, file })
        .collect()
}

/// The top's file, then the files declaring the reachable hierarchy, then
/// the package files they import, each group in path order.
fn selected_files(input: &AssembleInput<'_>) -> Vec<String> {
    let scan = input.scan;
    let top_file = input.top.declaring_file.clone();
    let mut chosen: BTreeSet<String> = BTreeSet::from([top_file.clone()]);
    let mut out = vec![top_file];

    let mut hierarchy = BTreeSet::new();
    for name in input.graph.reachable_from(&input.top.module) {
        let key = scan.name_key(&name);
        let decls: Vec<&str> = scan
            .modules
            .iter()
            .filter(|m| scan.name_key(&m.name) == key)
            .map(|m| m.file.as_str())
            .collect();
        // Prefer a declaration that is already part of the build.
        let file = decls
            .iter()
            .find(|f| chosen.contains(**f))
            .or_else(|| decls.first())
            .map(|f| f.to_string());
        if let Some(file) = file {
            if chosen.insert(file.clone()) {
                hierarchy.insert(file);
            }
        }
    }
    out.extend(hierarchy);

    let package_files: BTreeMap<String, &str> = scan
        .packages
        .iter()
        .map(|p| (scan.name_key(&p.name), p.file.as_str()))
        .rev()
        .collect();
    let mut packages = BTreeSet::new();
    let mut frontier: Vec<String> = chosen.iter().cloned().collect();
    while let Some(file) = frontier.pop() {
        for import in scan.imports.iter().filter(|i| i.file == file) {
            let Some(&pkg_file) = package_files.get(&scan.name_key(&import.package)) else {
                continue;
            };
            if chosen.insert(pkg_file.to_string()) {
                packages.insert(pkg_file.to_string());
                frontier.push(pkg_file.to_string());
            }
        }
    }
    out.extend(packages);
    out
}

fn dir_of(relative: &str) -> String {
    match relative.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => ".".to_string(),
    }
}

/// Joins `target` onto `dir`, folding `.` and `..` components.
fn join_normalized(dir: &str, target: &str) -> String {
    let mut parts: Vec<&str> = if dir == "." {
        Vec::new()
    } else {
        dir.split('/').collect()
    };
    for comp in target.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            c => parts.push(c),
        }
    }
    parts.join("/")
}

fn include_dirs(scan: &ProjectScan, files: &[String]) -> Vec<String> {
    let mut dirs: BTreeSet<String> = scan.headers.iter().map(|h| dir_of(h)).collect();

    let known: BTreeSet<&str> = scan
        .headers
        .iter()
        .chain(scan.files.iter())
        .map(String::as_str)
        .collect();
    let selected: BTreeSet<&str> = files.iter().map(String::as_str).collect();

    for include in scan.includes.iter().filter(|i| selected.contains(i.file.as_str())) {
        let beside = join_normalized(&dir_of(&include.file), &include.target);
        let suffix = format!("/{}", include.target.trim_start_matches("./"));
        let target = if known.contains(beside.as_str()) {
            Some(beside.as_str())
        } else {
            known
                .iter()
                .copied()
                .find(|k| *k == include.target || k.ends_with(&suffix))
        };
        if let Some(target) = target {
            // Only the part of the path that the directive does not spell out.
            let written_dirs = include.target.matches('/').count();
            let mut dir = dir_of(target);
            for _ in 0..written_dirs {
                dir = dir_of(&dir);
                if dir == "." {
                    break;
                }
            }
            dirs.insert(dir);
        }
    }
    dirs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdlmap_config::ResolverConfig;
    use hdlmap_diagnostics::DiagnosticSink;
    use hdlmap_scan::{scan_project, ScannerRegistry};
    use hdlmap_source::{DiscoveryOptions, SourceTree};
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        scan: ProjectScan,
        graph: DependencyGraph,
        db: SourceDb,
    }

    fn fixture(dialect: Dialect, files: &[(&str, &str)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        for (rel, content) in files {
            let p = dir.path().join(rel);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, content).unwrap();
        }
        let tree = SourceTree::discover(dir.path(), &DiscoveryOptions::default()).unwrap();
        let mut db = SourceDb::new(dir.path());
        let scan = scan_project(&tree, dialect, &ScannerRegistry::new().unwrap(), &mut db, &DiagnosticSink::new());
        let graph = DependencyGraph::build(&scan.modules, &scan.instantiations);
        Fixture {
            _dir: dir,
            scan,
            graph,
            db,
        }
    }

    fn assemble(f: &Fixture, top: &str, file: &str) -> ConfigDescriptor {
        let dialect = f.scan.dialect;
        let toolchain = ToolchainConfig::defaults_for(dialect);
        let assembler = Assembler::new(&ResolverConfig::defaults_for(dialect), "rv32i").unwrap();
        let top = ResolvedTop {
            module: top.to_string(),
            declaring_file: file.to_string(),
            score: 1.0,
        };
        assembler.assemble(&AssembleInput {
            name: "proj",
            folder: "proj",
            repository: None,
            scan: &f.scan,
            graph: &f.graph,
            db: &f.db,
            top: &top,
            toolchain: &toolchain,
            descriptor: None,
            entry: None,
        })
    }

    const CORE: &str = "// RV32IMC core\nmodule core(input clk, output [31:0] imem_addr, output [31:0] dmem_addr);\n  alu u_alu();\n  regfile u_rf();\nendmodule\n";

    #[test]
    fn files_follow_the_hierarchy() {
        let f = fixture(
            Dialect::Verilog,
            &[
                ("rtl/core.v", CORE),
                ("rtl/alu.v", "module alu; endmodule\n"),
                ("rtl/regfile.v", "module regfile; endmodule\n"),
                ("rtl/uart.v", "module uart; endmodule\n"),
                ("tb/tb_core.v", "module tb_core; core dut(); initial $finish; endmodule\n"),
            ],
        );
        let d = assemble(&f, "core", "rtl/core.v");
        assert_eq!(d.files, vec!["rtl/core.v", "rtl/alu.v", "rtl/regfile.v"]);
        assert_eq!(d.sim_files, vec!["tb/tb_core.v"]);
        assert_eq!(d.language, "verilog");
        assert_eq!(d.language_version.as_deref(), Some("2005"));
        assert_eq!(d.march.as_deref(), Some("rv32imc"));
        assert_eq!(d.two_memory, Some(true));
        assert!(d.is_simulable);
        assert_eq!(d.modules.len(), 5);
        assert_eq!(d.modules[0].file, "rtl/alu.v");
        assert!(d.build_sbt.is_none());
    }

    #[test]
    fn duplicate_declarations_prefer_a_selected_file() {
        let f = fixture(
            Dialect::Verilog,
            &[
                ("rtl/top.v", "module top(input clk);\n  mul u_mul();\n  xalu u_alu();\nendmodule\n"),
                ("rtl/units.v", "module mul; endmodule\nmodule xalu; endmodule\n"),
                ("lib/xalu.v", "module xalu; endmodule\n"),
            ],
        );
        let d = assemble(&f, "top", "rtl/top.v");
        assert_eq!(d.files, vec!["rtl/top.v", "rtl/units.v"]);
    }

    #[test]
    fn march_defaults_and_single_memory() {
        let f = fixture(Dialect::Verilog, &[("top.v", "module top(input clk, output [31:0] mem_addr); endmodule\n")]);
        let d = assemble(&f, "top", "top.v");
        assert_eq!(d.march.as_deref(), Some("rv32i"));
        assert_eq!(d.two_memory, Some(false));
        assert_eq!(d.files, vec!["top.v"]);
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let f = fixture(
            Dialect::Verilog,
            &[
                ("a.v", "module a; b u(); endmodule\n"),
                ("b.v", "module b; a u(); endmodule\n"),
            ],
        );
        let d = assemble(&f, "a", "a.v");
        assert_eq!(d.files, vec!["a.v", "b.v"]);
    }

    #[test]
    fn package_files_are_appended() {
        let f = fixture(
            Dialect::SystemVerilog,
            &[
                ("rtl/core.sv", "module core import core_pkg::*; (input logic clk);\n  alu u_alu();\nendmodule\n"),
                ("rtl/alu.sv", "module alu; import types_pkg::*; endmodule\n"),
                ("pkg/core_pkg.sv", "package core_pkg; import types_pkg::*; endpackage\n"),
                ("pkg/types_pkg.sv", "package types_pkg; endpackage\n"),
            ],
        );
        let d = assemble(&f, "core", "rtl/core.sv");
        assert_eq!(d.files, vec!["rtl/core.sv", "rtl/alu.sv", "pkg/core_pkg.sv", "pkg/types_pkg.sv"]);
        assert_eq!(d.language_version.as_deref(), Some("2017"));
    }

    #[test]
    fn include_dirs_from_headers_and_directives() {
        let f = fixture(
            Dialect::Verilog,
            &[
                ("rtl/core.v", "`include \"defs/config.vh\"\nmodule core; endmodule\n"),
                ("rtl/defs/config.vh", "`define XLEN 32\n"),
                ("inc/common.vh", "`define W 8\n"),
            ],
        );
        let d = assemble(&f, "core", "rtl/core.v");
        assert_eq!(d.include_dirs, vec!["inc", "rtl", "rtl/defs"]);
    }

    #[test]
    fn join_and_dir_helpers() {
        assert_eq!(dir_of("top.v"), ".");
        assert_eq!(dir_of("a/b/c.v"), "a/b");
        assert_eq!(join_normalized("rtl/core", "../inc/x.vh"), "rtl/inc/x.vh");
        assert_eq!(join_normalized(".", "./x.vh"), "x.vh");
    }

    #[test]
    fn assembly_is_deterministic() {
        let files = [("rtl/core.v", CORE), ("rtl/alu.v", "module alu; endmodule\n")];
        let a = assemble(&fixture(Dialect::Verilog, &files), "core", "rtl/core.v");
        let b = assemble(&fixture(Dialect::Verilog, &files), "core", "rtl/core.v");
        assert_eq!(a.to_json(false).unwrap(), b.to_json(false).unwrap());
    }
}
