//! The per-project pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hdlmap_common::{Dialect, InternalError};
use hdlmap_config::{resolve_resolver, resolve_toolchain, HdlmapConfig};
use hdlmap_descriptor::{BuildDescriptor, DescriptorLocator, EntryPoint};
use hdlmap_diagnostics::{codes, Diagnostic, DiagnosticSink};
use hdlmap_graph::DependencyGraph;
use hdlmap_resolve::{Resolution, ScoredCandidate, TopResolver};
use hdlmap_scan::{detect_dialect, scan_project, ProjectScan, ScannerRegistry};
use hdlmap_source::{SourceDb, SourceEntry, SourceTree, Span};
use serde::Serialize;

use crate::assemble::{AssembleInput, Assembler};
use crate::compile::{CommandCompiler, CompileError, CompileOutcome, CompileRequest, Compiler};
use crate::descriptor::ConfigDescriptor;
use crate::error::AnalysisError;

/// What to analyse and how.
#[derive(Clone, Debug, Default)]
pub struct AnalysisRequest {
    /// Project root.
    pub root: PathBuf,
    /// Repository-name hint; defaults to the root directory name.
    pub name: Option<String>,
    /// Explicit top module, skipping scoring.
    pub top: Option<String>,
    /// Dialect override, skipping detection.
    pub dialect: Option<Dialect>,
    /// Repository URL recorded in the descriptor.
    pub repository: Option<String>,
    /// Create the build descriptor and entry point on disk. When unset the
    /// paths they would have are still reported.
    pub write: bool,
    /// Run the configured compile command after assembly.
    pub compile: bool,
}

impl AnalysisRequest {
    /// A dry-run request for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// A scanned project and its instantiation graph.
pub struct ScannedProject {
    /// Discovered files.
    pub tree: SourceTree,
    /// Merged scan.
    pub scan: ProjectScan,
    /// Instantiation graph.
    pub graph: DependencyGraph,
}

/// Everything produced for one project.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisReport {
    /// The assembled configuration.
    pub descriptor: ConfigDescriptor,
    /// Every scored candidate, best first.
    pub candidates: Vec<ScoredCandidate>,
    /// Candidates that tied for the top score, when a tie was broken.
    pub tied: Vec<ScoredCandidate>,
    /// The top was given explicitly.
    pub overridden: bool,
    /// The located or synthesized build descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_descriptor: Option<BuildDescriptor>,
    /// The reused or generated entry point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<EntryPoint>,
    /// The compile result, when compilation was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile: Option<CompileOutcome>,
}

/// Discovers, detects and scans the project at `root`, then builds its
/// graph. File contents are loaded into `db` so diagnostics sent to `sink`
/// can be rendered afterwards.
pub fn scan_tree(
    root: &Path,
    dialect: Option<Dialect>,
    config: &HdlmapConfig,
    registry: &ScannerRegistry,
    db: &mut SourceDb,
    sink: &DiagnosticSink,
) -> Result<ScannedProject, AnalysisError> {
    let tree = SourceTree::discover(root, &config.discovery.to_options()).map_err(|source| AnalysisError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let Some(dialect) = detect_dialect(&tree, dialect) else {
        return Err(AnalysisError::EmptyProject {
            root: root.to_path_buf(),
        });
    };
    tracing::info!(root = %root.display(), dialect = %dialect, "analysing project");

    let scan = scan_project(&tree, dialect, registry, db, sink);
    if scan.is_empty() {
        return Err(AnalysisError::EmptyProject {
            root: root.to_path_buf(),
        });
    }

    let graph = DependencyGraph::build(&scan.modules, &scan.instantiations);
    sink.extend(graph.cycle_diagnostics(&scan.modules));
    Ok(ScannedProject { tree, scan, graph })
}

/// Runs the whole pipeline for one project.
///
/// `db` should be empty and rooted at `request.root`. Per-file problems are
/// reported to `sink` and never fail the project.
/// Compilation problems are recorded in the report with an `E401`/`E402`
/// diagnostic and never discard the assembled descriptor.
pub fn analyze_project(
    request: &AnalysisRequest,
    config: &HdlmapConfig,
    registry: &ScannerRegistry,
    db: &mut SourceDb,
    sink: &DiagnosticSink,
) -> Result<AnalysisReport, AnalysisError> {
    let project = scan_tree(&request.root, request.dialect, config, registry, db, sink)?;
    let dialect = project.scan.dialect;
    let folder = project.tree.folder_name();
    let name = request.name.clone().unwrap_or_else(|| folder.clone());

    let resolver = TopResolver::new(resolve_resolver(config, dialect))?;
    let resolution = match &request.top {
        Some(top) => resolver.resolve_override(
            top,
            &project.scan.modules,
            &project.graph,
            &project.scan.interfaces,
            Some(&name),
            sink,
        ),
        None => resolver.resolve(
            &project.scan.modules,
            &project.graph,
            &project.scan.interfaces,
            Some(&name),
            sink,
        ),
    };

    let Resolution {
        top,
        candidates,
        tied,
        overridden,
    } = resolution;
    let Some(top) = top else {
        if tied.is_empty() {
            return Err(AnalysisError::NoTopFound { candidates });
        }
        return Err(AnalysisError::AmbiguousTop { tied, candidates });
    };
    if project.scan.find_module(&top.module).is_none() {
        return Err(InternalError::new(format!("resolved top '{}' was never scanned", top.module)).into());
    }

    let toolchain = resolve_toolchain(config, dialect);
    let options = config.discovery.to_options();
    let (build_descriptor, entry_point) = if dialect.is_namespace_based() {
        let locator = DescriptorLocator::new(&request.root, &toolchain, &options)
            .with_write(request.write)
            .with_project_name(name.clone());
        let descriptor = locator.locate_or_create(&top, sink)?;
        let scala: Vec<SourceEntry> = project
            .tree
            .sources()
            .iter()
            .filter(|e| e.extension() == "scala")
            .cloned()
            .collect();
        let entry = locator.place_entry_point(&top, &descriptor, &scala, sink)?;
        (Some(descriptor), Some(entry))
    } else {
        (None, None)
    };

    let assembler = Assembler::new(resolver.config(), config.output.default_march.clone())?;
    let descriptor = assembler.assemble(&AssembleInput {
        name: &name,
        folder: &folder,
        repository: request.repository.as_deref(),
        scan: &project.scan,
        graph: &project.graph,
        db: &*db,
        top: &top,
        toolchain: &toolchain,
        descriptor: build_descriptor.as_ref(),
        entry: entry_point.as_ref(),
    });

    let compile = if request.compile {
        run_compile(&request.root, config, &descriptor, sink)
    } else {
        None
    };

    Ok(AnalysisReport {
        descriptor,
        candidates,
        tied,
        overridden,
        build_descriptor,
        entry_point,
        compile,
    })
}

fn run_compile(
    root: &Path,
    config: &HdlmapConfig,
    descriptor: &ConfigDescriptor,
    sink: &DiagnosticSink,
) -> Option<CompileOutcome> {
    let Some(program) = &config.compile.command else {
        tracing::warn!("compilation requested but no [compile] command is configured");
        return None;
    };
    let compiler = CommandCompiler::new(program.clone(), config.compile.args.iter().cloned());
    let request = CompileRequest {
        top_module: descriptor.top_module.clone(),
        files: descriptor.files.clone(),
        search_paths: descriptor.include_dirs.clone(),
        out_dir: root.join(&config.compile.out_dir),
        working_dir: root.to_path_buf(),
        timeout: Duration::from_secs(config.compile.timeout_secs),
    };

    let outcome = match compiler.compile(&request) {
        Ok(outcome) => {
            if !outcome.success {
                sink.emit(
                    Diagnostic::error(
                        codes::COMPILE_FAILED,
                        format!("compiling '{}' failed", descriptor.top_module),
                        Span::DUMMY,
                    )
                    .with_note(last_lines(&outcome.log, 20)),
                );
            }
            outcome
        }
        Err(err) => {
            let code = match err {
                CompileError::Timeout { .. } => codes::COMPILE_TIMEOUT,
                _ => codes::COMPILE_FAILED,
            };
            sink.emit(Diagnostic::error(code, err.to_string(), Span::DUMMY));
            CompileOutcome::from_error(&err)
        }
    };
    Some(outcome)
}

fn last_lines(log: &str, n: usize) -> String {
    let lines: Vec<&str> = log.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
