//! The compile collaborator: hands the assembled file list to an external
//! HDL toolchain under a timeout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;

/// Inputs to one compilation.
#[derive(Clone, Debug)]
pub struct CompileRequest {
    /// Module to elaborate.
    pub top_module: String,
    /// Source files in compilation order, relative to `working_dir`.
    pub files: Vec<String>,
    /// Include search directories, relative to `working_dir`.
    pub search_paths: Vec<String>,
    /// Where artifacts go.
    pub out_dir: PathBuf,
    /// Directory the tool runs in.
    pub working_dir: PathBuf,
    /// Upper bound on the tool's run time.
    pub timeout: Duration,
}

/// The result of a compilation that ran to completion.
#[derive(Clone, Debug, Serialize)]
pub struct CompileOutcome {
    /// The tool exited successfully.
    pub success: bool,
    /// The produced artifact, when one was found.
    pub artifact_path: Option<PathBuf>,
    /// Combined standard output and error.
    pub log: String,
}

impl CompileOutcome {
    /// Records a compilation that could not complete.
    pub fn from_error(err: &CompileError) -> Self {
        Self {
            success: false,
            artifact_path: None,
            log: err.to_string(),
        }
    }
}

/// Failures to run the tool at all.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The tool did not finish in time and was killed.
    #[error("compilation timed out after {secs}s")]
    Timeout {
        /// The configured limit.
        secs: u64,
    },

    /// The tool could not be started.
    #[error("cannot run '{program}': {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Another I/O failure.
    #[error("compile I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can compile an assembled design.
pub trait Compiler: Send + Sync {
    /// Compiles `request`, blocking until the tool exits or times out.
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutcome, CompileError>;
}

/// Runs a configured command line.
///
/// Arguments may contain placeholders: `{top}` and `{out}` are substituted
/// textually, while an argument that is exactly `{files}` or
/// `{include_dirs}` expands to one argument per entry.
#[derive(Clone, Debug)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    /// Creates a compiler running `program` with the argument template `args`.
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Expands the argument template for `request`.
    pub fn expand_args(&self, request: &CompileRequest) -> Vec<String> {
        let out = request.out_dir.to_string_lossy();
        let mut expanded = Vec::with_capacity(self.args.len() + request.files.len());
        for arg in &self.args {
            match arg.as_str() {
                "{files}" => expanded.extend(request.files.iter().cloned()),
                "{include_dirs}" => expanded.extend(request.search_paths.iter().cloned()),
                _ => expanded.push(
                    arg.replace("{top}", &request.top_module)
                        .replace("{out}", &out)
                        .replace("{files}", &request.files.join(" "))
                        .replace("{include_dirs}", &request.search_paths.join(" ")),
                ),
            }
        }
        expanded
    }

    async fn run(&self, request: &CompileRequest) -> Result<CompileOutcome, CompileError> {
        tokio::fs::create_dir_all(&request.out_dir).await?;
        let args = self.expand_args(request);
        tracing::debug!(program = %self.program, args = ?args, "spawning compiler");

        let child = Command::new(&self.program)
            .args(&args)
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CompileError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Dropping the timed-out future drops the child, which kills it.
        let output = match tokio::time::timeout(request.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                tracing::warn!(program = %self.program, secs = request.timeout.as_secs(), "compiler timed out");
                return Err(CompileError::Timeout {
                    secs: request.timeout.as_secs(),
                });
            }
        };

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !log.is_empty() && !log.ends_with('\n') {
                log.push('\n');
            }
            log.push_str(&stderr);
        }

        let success = output.status.success();
        let artifact_path = if success {
            find_artifact(&request.out_dir, &request.top_module)
        } else {
            None
        };
        tracing::info!(success, artifact = ?artifact_path, "compilation finished");
        Ok(CompileOutcome {
            success,
            artifact_path,
            log,
        })
    }
}

impl Compiler for CommandCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutcome, CompileError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(request))
    }
}

fn find_artifact(out_dir: &Path, top: &str) -> Option<PathBuf> {
    ["v", "sv", "json", "fir"]
        .iter()
        .map(|ext| out_dir.join(format!("{top}.{ext}")))
        .find(|p| p.is_file())
}
