//! Whole-project scanning: load, scan in parallel, merge, resolve names.

use std::collections::{BTreeMap, BTreeSet};

use hdlmap_common::Dialect;
use hdlmap_diagnostics::{codes, Diagnostic, DiagnosticSink, Label};
use hdlmap_source::{FileId, SourceDb, SourceTree};
use rayon::prelude::*;

use crate::error::ScanError;
use crate::model::{FileScan, IncludeRef, Instantiation, Interface, Module, PackageDecl, PackageImport};
use crate::registry::ScannerRegistry;

/// The merged scan of one project.
///
/// Every list is in relative-path order, and in source order within a file.
#[derive(Debug, Clone)]
pub struct ProjectScan {
    /// Dialect the project was scanned with.
    pub dialect: Dialect,
    /// All declared modules.
    pub modules: Vec<Module>,
    /// All instantiations, with `resolved` set against `modules`.
    pub instantiations: Vec<Instantiation>,
    /// All interface declarations.
    pub interfaces: Vec<Interface>,
    /// All package declarations.
    pub packages: Vec<PackageDecl>,
    /// All package imports.
    pub imports: Vec<PackageImport>,
    /// All include directives.
    pub includes: Vec<IncludeRef>,
    /// Relative paths of the files that were scanned.
    pub files: Vec<String>,
    /// Relative paths of discovered header files.
    pub headers: Vec<String>,
}

impl ProjectScan {
    /// Returns `true` if no module was recognized.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Returns the lookup key for a name in this project's dialect.
    pub fn name_key(&self, name: &str) -> String {
        name_key(self.dialect, name)
    }

    /// Returns the first declaration of `name`, matching case-insensitively
    /// for case-insensitive dialects.
    pub fn find_module(&self, name: &str) -> Option<&Module> {
        let key = self.name_key(name);
        self.modules.iter().find(|m| self.name_key(&m.name) == key)
    }

    /// Returns the distinct module names in declaration order.
    pub fn module_names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.modules
            .iter()
            .filter(|m| seen.insert(self.name_key(&m.name)))
            .map(|m| m.name.as_str())
            .collect()
    }
}

fn name_key(dialect: Dialect, name: &str) -> String {
    if dialect.case_insensitive() {
        name.to_ascii_lowercase()
    } else {
        name.to_string()
    }
}

/// Scans every file of `tree` accepted by the scanner for `dialect`.
///
/// Files are loaded into `db` sequentially (so file ids follow path order),
/// scanned in parallel, and merged in path order. Unreadable files become
/// `E101` diagnostics; duplicate module names become `W103` warnings.
/// Returns an empty scan if no scanner is registered for `dialect`.
pub fn scan_project(
    tree: &SourceTree,
    dialect: Dialect,
    registry: &ScannerRegistry,
    db: &mut SourceDb,
    sink: &DiagnosticSink,
) -> ProjectScan {
    let mut project = ProjectScan {
        dialect,
        modules: Vec::new(),
        instantiations: Vec::new(),
        interfaces: Vec::new(),
        packages: Vec::new(),
        imports: Vec::new(),
        includes: Vec::new(),
        files: Vec::new(),
        headers: tree.headers().iter().map(|h| h.relative.clone()).collect(),
    };

    let Some(scanner) = registry.get(dialect) else {
        tracing::warn!(dialect = %dialect, "no scanner registered for dialect");
        return project;
    };

    let mut ids: Vec<FileId> = Vec::new();
    for entry in tree.sources().iter().filter(|e| scanner.accepts(e)) {
        match db.load_file(&entry.path) {
            Ok(id) => ids.push(id),
            Err(source) => {
                let err = ScanError::Unreadable {
                    path: entry.relative.clone(),
                    source,
                };
                tracing::warn!(error = %err, "skipping file");
                sink.emit(err.to_diagnostic());
            }
        }
    }

    let db: &SourceDb = db;
    let scans: Vec<(FileId, FileScan)> = ids
        .par_iter()
        .map(|&id| (id, scanner.scan_file(db.get_file(id))))
        .collect();

    for (id, scan) in scans {
        let file = db.get_file(id);
        tracing::debug!(
            file = %file.relative,
            modules = scan.modules.len(),
            instantiations = scan.instantiations.len(),
            "scanned file"
        );
        project.files.push(file.relative.clone());
        sink.extend(scan.diagnostics);
        merge_modules(&mut project.modules, scan.modules, dialect, sink);
        project.instantiations.extend(scan.instantiations);
        project.interfaces.extend(scan.interfaces);
        project.packages.extend(scan.packages);
        project.imports.extend(scan.imports);
        project.includes.extend(scan.includes);
    }

    resolve_instantiations(&mut project);
    project
}

/// Appends one file's modules, keeping one record per (name, file) and
/// warning about names already declared elsewhere.
fn merge_modules(all: &mut Vec<Module>, incoming: Vec<Module>, dialect: Dialect, sink: &DiagnosticSink) {
    for module in incoming {
        let key = name_key(dialect, &module.name);
        // `ifdef alternatives declare the same name twice in one file.
        if all
            .iter()
            .any(|m| m.file == module.file && name_key(dialect, &m.name) == key)
        {
            continue;
        }
        let first = all.iter().find(|m| name_key(dialect, &m.name) == key);
        if let Some(first) = first {
            sink.emit(
                Diagnostic::warning(
                    codes::DUPLICATE_MODULE,
                    format!("module '{}' is declared in more than one file", module.name),
                    module.span,
                )
                .with_path(module.file.clone())
                .with_label(Label::primary(module.span, "declared again here"))
                .with_label(Label::secondary(first.span, format!("first declared in {}", first.file)))
                .with_note("both declarations are kept as separate candidates"),
            );
        }
        all.push(module);
    }
}

fn resolve_instantiations(project: &mut ProjectScan) {
    let dialect = project.dialect;
    let mut canonical: BTreeMap<String, String> = BTreeMap::new();
    for m in &project.modules {
        canonical
            .entry(name_key(dialect, &m.name))
            .or_insert_with(|| m.name.clone());
    }
    for inst in &mut project.instantiations {
        if let Some(name) = canonical.get(&name_key(dialect, &inst.child)) {
            inst.child = name.clone();
            inst.resolved = true;
        }
        if let Some(name) = canonical.get(&name_key(dialect, &inst.parent)) {
            inst.parent = name.clone();
        }
    }
}
