//! Conformance test helpers for hdlmap.
//!
//! Provides on-disk project fixtures and shared pipeline functions that run
//! a fixture through discovery, scanning, resolution and assembly and return
//! structured results for assertion in integration tests.

#![warn(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use hdlmap_assemble::{analyze_project, scan_tree, AnalysisError, AnalysisReport, AnalysisRequest, ScannedProject};
use hdlmap_config::HdlmapConfig;
use hdlmap_diagnostics::{Diagnostic, DiagnosticSink};
use hdlmap_scan::ScannerRegistry;
use hdlmap_source::SourceDb;
use tempfile::TempDir;

/// A project tree written into a temporary directory.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    /// Creates a fixture holding `files` as (relative path, content) pairs.
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("create fixture directory");
        let fixture = Self { dir };
        for (rel, content) in files {
            fixture.write(rel, content);
        }
        fixture
    }

    /// Writes (or overwrites) one file.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture subdirectory");
        }
        fs::write(path, content).expect("write fixture file");
    }

    /// The fixture root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Returns `true` if `rel` exists under the root.
    pub fn exists(&self, rel: &str) -> bool {
        self.dir.path().join(rel).exists()
    }

    /// Reads a file under the root.
    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.dir.path().join(rel)).expect("read fixture file")
    }

    /// A dry-run request for this fixture with a fixed repository name, so
    /// results never depend on the random directory name.
    pub fn request(&self, name: &str) -> AnalysisRequest {
        AnalysisRequest {
            root: self.dir.path().to_path_buf(),
            name: Some(name.to_string()),
            ..AnalysisRequest::default()
        }
    }
}

/// Result of running the full analysis pipeline.
pub struct PipelineResult {
    /// The report, or the project-level error.
    pub result: Result<AnalysisReport, AnalysisError>,
    /// All diagnostics emitted during the run.
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineResult {
    /// The report; panics with the error otherwise.
    pub fn report(&self) -> &AnalysisReport {
        match &self.result {
            Ok(report) => report,
            Err(e) => panic!("analysis failed: {e}"),
        }
    }

    /// The diagnostic codes in emission order, e.g. `["W201", "H002"]`.
    pub fn codes(&self) -> Vec<String> {
        self.diagnostics.iter().map(|d| d.code.to_string()).collect()
    }
}

/// Runs the pipeline with the default configuration.
pub fn run(request: &AnalysisRequest) -> PipelineResult {
    run_with_config(request, &HdlmapConfig::default())
}

/// Runs the pipeline with an explicit configuration.
pub fn run_with_config(request: &AnalysisRequest, config: &HdlmapConfig) -> PipelineResult {
    let registry = ScannerRegistry::new().expect("built-in scanners compile");
    let sink = DiagnosticSink::new();
    let mut db = SourceDb::new(&request.root);
    let result = analyze_project(request, config, &registry, &mut db, &sink);
    PipelineResult {
        result,
        diagnostics: sink.take_all(),
    }
}

/// Scans `root` and builds its graph without resolving a top.
pub fn scan_only(root: &Path) -> ScannedProject {
    let registry = ScannerRegistry::new().expect("built-in scanners compile");
    let sink = DiagnosticSink::new();
    let mut db = SourceDb::new(root);
    match scan_tree(root, None, &HdlmapConfig::default(), &registry, &mut db, &sink) {
        Ok(project) => project,
        Err(e) => panic!("scan failed: {e}"),
    }
}

/// Every file under `root` named `name`, relative and sorted.
pub fn files_named(root: &Path, name: &str) -> Vec<PathBuf> {
    fn walk(dir: &Path, root: &Path, name: &str, out: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(&path, root, name, out);
            } else if path.file_name().and_then(|n| n.to_str()) == Some(name) {
                out.push(path.strip_prefix(root).unwrap_or(&path).to_path_buf());
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, name, &mut out);
    out.sort();
    out
}
