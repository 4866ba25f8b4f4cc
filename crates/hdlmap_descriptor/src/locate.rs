//! Build-descriptor location strategies.

use std::path::{Path, PathBuf};

use hdlmap_config::ToolchainConfig;
use hdlmap_diagnostics::{codes, Diagnostic, DiagnosticSink};
use hdlmap_resolve::ResolvedTop;
use hdlmap_source::{relative_path, DiscoveryOptions, Span};
use regex::Regex;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::DescriptorError;
use crate::template::render_descriptor;
use crate::write::{write_new, WriteOutcome};

/// Evidence weights for ranking candidate descriptors by content.
const MENTIONS_TOP: i32 = 10;
const DECLARES_TOOLCHAIN: i32 = 5;
const MENTIONS_SUBPROJECT: i32 = 3;

/// How a build descriptor was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Nearest descriptor above the top module's file, below the root.
    Proximity,
    /// Best-ranked descriptor by content.
    ContentAffinity,
    /// The descriptor at the project root.
    Root,
    /// Newly written.
    Synthesized,
}

/// The build descriptor chosen for a project.
#[derive(Clone, Debug, Serialize)]
pub struct BuildDescriptor {
    /// Absolute path.
    #[serde(skip)]
    pub path: PathBuf,
    /// Path relative to the project root.
    pub relative: String,
    /// The file existed before this run.
    pub exists_prior: bool,
    /// The file was (or in a dry run would be) generated.
    pub synthesized: bool,
    /// The strategy that produced it.
    pub strategy: Strategy,
}

impl BuildDescriptor {
    /// Directory of the descriptor relative to the root (`""` for the root).
    pub fn relative_dir(&self) -> &str {
        self.relative.rsplit_once('/').map_or("", |(dir, _)| dir)
    }
}

/// Lists every descriptor file under `root`, relative and sorted.
///
/// Excluded directories are pruned as during source discovery.
pub fn find_descriptors(root: &Path, names: &[String], options: &DiscoveryOptions) -> Vec<String> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !e.file_name().to_str().is_some_and(|n| options.is_excluded_dir(n))
        });

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        let is_descriptor = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|n| names.iter().any(|d| d == n));
        if is_descriptor {
            found.push(relative_path(root, entry.path()));
        }
    }
    found.sort();
    found
}

/// `text` contains `word` as a whole identifier, so `Core` does not match
/// `CoreMark`.
fn mentions_word(text: &str, word: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(word))).is_ok_and(|re| re.is_match(text))
}

/// Returns the sub-project directory of a source file: the directory that
/// holds the `src` of a `src/main/<lang>` source root. `None` means the
/// project root.
pub(crate) fn subproject_dir(relative_file: &str) -> Option<String> {
    let comps: Vec<&str> = relative_file.split('/').collect();
    let dirs = &comps[..comps.len().saturating_sub(1)];
    let pos = (0..dirs.len())
        .rev()
        .find(|&i| dirs[i] == "src" && dirs.get(i + 1) == Some(&"main"))?;
    if pos == 0 {
        None
    } else {
        Some(dirs[..pos].join("/"))
    }
}

/// Joins relative path pieces, skipping empty ones.
pub(crate) fn join_rel(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// Finds or creates the build descriptor and entry point for a project.
pub struct DescriptorLocator<'a> {
    pub(crate) root: &'a Path,
    pub(crate) toolchain: &'a ToolchainConfig,
    options: &'a DiscoveryOptions,
    pub(crate) write: bool,
    project_name: String,
}

impl<'a> DescriptorLocator<'a> {
    /// Creates a locator that writes generated files.
    pub fn new(root: &'a Path, toolchain: &'a ToolchainConfig, options: &'a DiscoveryOptions) -> Self {
        Self {
            root,
            toolchain,
            options,
            write: true,
            project_name: String::new(),
        }
    }

    /// Sets whether generated files are written (`false` for dry runs).
    pub fn with_write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// Sets the project name used in synthesized descriptors.
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    fn existing(&self, relative: &str, strategy: Strategy) -> BuildDescriptor {
        BuildDescriptor {
            path: self.root.join(relative),
            relative: relative.to_string(),
            exists_prior: true,
            synthesized: false,
            strategy,
        }
    }

    /// Nearest descriptor in a directory above `file`, excluding the root.
    fn by_proximity(&self, file: &str) -> Option<String> {
        let comps: Vec<&str> = file.split('/').collect();
        for k in (1..comps.len()).rev() {
            let dir = comps[..k].join("/");
            for name in &self.toolchain.descriptor_names {
                let candidate = join_rel(&[&dir, name]);
                if self.root.join(&candidate).is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn affinity_score(&self, text: &str, top: &str, subproject: Option<&str>) -> i32 {
        let lower = text.to_ascii_lowercase();
        let mut score = 0;
        if mentions_word(text, top) {
            score += MENTIONS_TOP;
        }
        if self
            .toolchain
            .dependency_markers
            .iter()
            .any(|m| lower.contains(&m.to_ascii_lowercase()))
        {
            score += DECLARES_TOOLCHAIN;
        }
        if subproject.is_some_and(|s| mentions_word(text, s)) {
            score += MENTIONS_SUBPROJECT;
        }
        score
    }

    fn by_content(&self, top: &ResolvedTop) -> Option<String> {
        let subproject = subproject_dir(&top.declaring_file);
        let sub_name = subproject.as_deref().and_then(|s| s.rsplit('/').next());

        let mut best: Option<(i32, usize, String)> = None;
        for rel in find_descriptors(self.root, &self.toolchain.descriptor_names, self.options) {
            let text = match std::fs::read(self.root.join(&rel)) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(err) => {
                    tracing::debug!(descriptor = %rel, error = %err, "skipping unreadable descriptor");
                    continue;
                }
            };
            let score = self.affinity_score(&text, &top.module, sub_name);
            if score <= 0 {
                continue;
            }
            let depth = rel.matches('/').count();
            let better = match &best {
                None => true,
                Some((s, d, r)) => score > *s || (score == *s && (depth, &rel) < (*d, r)),
            };
            if better {
                best = Some((score, depth, rel));
            }
        }
        best.map(|(_, _, rel)| rel)
    }

    fn at_root(&self) -> Option<String> {
        self.toolchain
            .descriptor_names
            .iter()
            .find(|n| self.root.join(n.as_str()).is_file())
            .cloned()
    }

    /// Finds the build descriptor for `top`, writing a minimal one when no
    /// strategy finds an existing file.
    pub fn locate_or_create(
        &self,
        top: &ResolvedTop,
        sink: &DiagnosticSink,
    ) -> Result<BuildDescriptor, DescriptorError> {
        let found = self
            .by_proximity(&top.declaring_file)
            .map(|r| (r, Strategy::Proximity))
            .or_else(|| self.by_content(top).map(|r| (r, Strategy::ContentAffinity)))
            .or_else(|| self.at_root().map(|r| (r, Strategy::Root)));

        if let Some((relative, strategy)) = found {
            tracing::info!(descriptor = %relative, strategy = ?strategy, "located build descriptor");
            return Ok(self.existing(&relative, strategy));
        }

        let name = self
            .toolchain
            .descriptor_names
            .iter()
            .find(|n| n.ends_with(".sbt"))
            .map_or("build.sbt", String::as_str);
        let dir = subproject_dir(&top.declaring_file).unwrap_or_default();
        let relative = join_rel(&[&dir, name]);
        let path = self.root.join(&relative);
        let project = if self.project_name.is_empty() {
            top.module.as_str()
        } else {
            self.project_name.as_str()
        };

        let mut exists_prior = false;
        if self.write {
            let content = render_descriptor(self.toolchain, project);
            exists_prior = write_new(&path, &content)? == WriteOutcome::Reused;
        }

        let verb = if self.write { "wrote" } else { "would write" };
        sink.emit(
            Diagnostic::note(
                codes::DESCRIPTOR_SYNTHESIZED,
                format!("no build descriptor found; {verb} a minimal one at {relative}"),
                Span::DUMMY,
            )
            .with_path(relative.clone()),
        );
        tracing::info!(descriptor = %relative, write = self.write, "synthesized build descriptor");

        Ok(BuildDescriptor {
            path,
            relative,
            exists_prior,
            synthesized: true,
            strategy: Strategy::Synthesized,
        })
    }
}
