//! The normalized records every scanner produces.

use std::collections::BTreeSet;

use hdlmap_common::Dialect;
use hdlmap_diagnostics::Diagnostic;
use hdlmap_source::Span;
use serde::Serialize;

/// A dialect-specific property of a unit declaration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleAttribute {
    /// Marked for separate synthesis (Bluespec `(* synthesize *)`).
    Synthesize,
    /// Takes parameters or generics.
    Parametric,
    /// Provides the empty interface (Bluespec `Empty`).
    EmptyInterface,
    /// Has no port list.
    NoPorts,
    /// Contains simulation-only constructs.
    SimulationOnly,
    /// An external black box.
    Blackbox,
    /// The end marker was missing.
    Unterminated,
}

/// A declared hardware unit.
///
/// Names are not unique across a project; there is one record per
/// (name, file) pair.
#[derive(Clone, Debug, Serialize)]
pub struct Module {
    /// Declared name.
    pub name: String,
    /// Declaring file, relative to the project root.
    pub file: String,
    /// Dialect of the declaring file.
    pub dialect: Dialect,
    /// Recognized properties.
    pub attributes: BTreeSet<ModuleAttribute>,
    /// Location of the declaration keyword through the name.
    #[serde(skip)]
    pub span: Span,
}

impl Module {
    /// Creates a module record without attributes.
    pub fn new(name: impl Into<String>, file: impl Into<String>, dialect: Dialect, span: Span) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            dialect,
            attributes: BTreeSet::new(),
            span,
        }
    }

    /// Returns `true` if the module carries `attr`.
    pub fn has(&self, attr: ModuleAttribute) -> bool {
        self.attributes.contains(&attr)
    }
}

/// A reference from one unit's body to another unit by name.
#[derive(Clone, Debug, Serialize)]
pub struct Instantiation {
    /// Name of the instantiating module.
    pub parent: String,
    /// File declaring the parent.
    pub parent_file: String,
    /// Referenced name, canonicalized to the declared spelling when resolved.
    pub child: String,
    /// Whether `child` names a module declared in the project.
    pub resolved: bool,
    /// Location of the reference.
    #[serde(skip)]
    pub span: Span,
}

/// A declared interface, bundle or interface type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Interface {
    /// Declared name.
    pub name: String,
    /// Declaring file.
    pub file: String,
}

/// A declared package.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackageDecl {
    /// Package name.
    pub name: String,
    /// Declaring file.
    pub file: String,
}

/// A file importing a package by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackageImport {
    /// Importing file.
    pub file: String,
    /// Imported package name.
    pub package: String,
}

/// A textual include directive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncludeRef {
    /// Including file.
    pub file: String,
    /// Include target exactly as written.
    pub target: String,
}

/// Everything recognized in one file.
#[derive(Debug, Default)]
pub struct FileScan {
    /// Unit declarations in source order.
    pub modules: Vec<Module>,
    /// Instantiations in source order, not yet resolved.
    pub instantiations: Vec<Instantiation>,
    /// Interface declarations.
    pub interfaces: Vec<Interface>,
    /// Package declarations.
    pub packages: Vec<PackageDecl>,
    /// Package imports.
    pub imports: Vec<PackageImport>,
    /// Include directives.
    pub includes: Vec<IncludeRef>,
    /// Recoverable problems found while scanning.
    pub diagnostics: Vec<Diagnostic>,
}
