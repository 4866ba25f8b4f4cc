//! Source tree discovery with directory exclusion.
//!
//! Discovery is shared infrastructure: it knows nothing about dialects beyond
//! the file extensions it is told to collect. Build output, vendor, test and
//! version-control directories are pruned by name before descending.

use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

/// Options controlling which files a [`SourceTree`] collects.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Directory names to prune. A trailing `*` matches by prefix.
    /// Matching is ASCII case-insensitive.
    pub exclude_dirs: Vec<String>,
    /// Extensions (without the dot) of source files to collect.
    pub source_extensions: Vec<String>,
    /// Extensions (without the dot) of header/include files to collect.
    pub header_extensions: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            exclude_dirs: [
                ".git",
                ".svn",
                ".hg",
                "build",
                "out",
                "output",
                "target",
                "obj_dir",
                "node_modules",
                "vendor",
                "third_party",
                "3rdparty",
                "test",
                "tests",
                "testbench",
                "project",
                ".bloop",
                ".metals",
                ".idea",
                ".vscode",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            source_extensions: ["v", "sv", "vhd", "vhdl", "bsv", "scala"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            header_extensions: ["vh", "svh", "inc"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DiscoveryOptions {
    /// Returns `true` if a directory with this name must not be descended into.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|pattern| {
            match pattern.strip_suffix('*') {
                Some(prefix) => name
                    .get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
                None => name.eq_ignore_ascii_case(pattern),
            }
        })
    }

    fn has_extension(list: &[String], path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| list.iter().any(|l| l.eq_ignore_ascii_case(ext)))
    }
}

/// A discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Absolute (or root-joined) filesystem path.
    pub path: PathBuf,
    /// Path relative to the project root with `/` separators.
    pub relative: String,
}

impl SourceEntry {
    /// Returns the lowercase extension of the file, or an empty string.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// A read-only snapshot of the interesting files of one project.
///
/// Both lists are sorted by relative path, so iteration order never depends
/// on filesystem traversal order.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    sources: Vec<SourceEntry>,
    headers: Vec<SourceEntry>,
}

impl SourceTree {
    /// Walks `root` and collects source and header files.
    ///
    /// Unreadable directory entries are skipped with a log message; only a
    /// missing or non-directory root is an error.
    pub fn discover(root: &Path, options: &DiscoveryOptions) -> Result<Self, io::Error> {
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            ));
        }

        let mut sources = Vec::new();
        let mut headers = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| options.is_excluded_dir(name))
            });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let item = SourceEntry {
                path: path.to_path_buf(),
                relative: relative_path(root, path),
            };
            if DiscoveryOptions::has_extension(&options.source_extensions, path) {
                sources.push(item);
            } else if DiscoveryOptions::has_extension(&options.header_extensions, path) {
                headers.push(item);
            }
        }

        sources.sort_by(|a, b| a.relative.cmp(&b.relative));
        headers.sort_by(|a, b| a.relative.cmp(&b.relative));

        tracing::debug!(
            root = %root.display(),
            sources = sources.len(),
            headers = headers.len(),
            "discovered source tree"
        );

        Ok(Self {
            root: root.to_path_buf(),
            sources,
            headers,
        })
    }

    /// Builds a tree from explicit entries (used by tests and callers that
    /// already have a file list).
    pub fn from_entries(root: &Path, mut sources: Vec<SourceEntry>, mut headers: Vec<SourceEntry>) -> Self {
        sources.sort_by(|a, b| a.relative.cmp(&b.relative));
        headers.sort_by(|a, b| a.relative.cmp(&b.relative));
        Self {
            root: root.to_path_buf(),
            sources,
            headers,
        }
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source files in relative-path order.
    pub fn sources(&self) -> &[SourceEntry] {
        &self.sources
    }

    /// Header files in relative-path order.
    pub fn headers(&self) -> &[SourceEntry] {
        &self.headers
    }

    /// Returns `true` if no source files were found.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns the root directory's own name, used as the default project name.
    pub fn folder_name(&self) -> String {
        self.root
            .canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(&self.root)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project")
            .to_string()
    }
}

/// Renders `path` relative to `root` with `/` separators.
///
/// Paths outside `root` are rendered in full.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
        })
        .collect();
    let joined = parts.join("/");
    if rel.has_root() {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, "").unwrap();
    }

    #[test]
    fn discovers_sources_and_headers_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "rtl/z_core.v");
        touch(tmp.path(), "rtl/alu.sv");
        touch(tmp.path(), "rtl/defs.vh");
        touch(tmp.path(), "README.md");

        let tree = SourceTree::discover(tmp.path(), &DiscoveryOptions::default()).unwrap();
        let rels: Vec<_> = tree.sources().iter().map(|e| e.relative.as_str()).collect();
        assert_eq!(rels, vec!["rtl/alu.sv", "rtl/z_core.v"]);
        assert_eq!(tree.headers().len(), 1);
        assert_eq!(tree.headers()[0].relative, "rtl/defs.vh");
    }

    #[test]
    fn excluded_directories_are_pruned() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/core.v");
        touch(tmp.path(), "build/gen.v");
        touch(tmp.path(), ".git/objects/x.v");
        touch(tmp.path(), "Tests/tb.v");
        touch(tmp.path(), "vendor/ip/pll.v");

        let tree = SourceTree::discover(tmp.path(), &DiscoveryOptions::default()).unwrap();
        let rels: Vec<_> = tree.sources().iter().map(|e| e.relative.as_str()).collect();
        assert_eq!(rels, vec!["src/core.v"]);
    }

    #[test]
    fn wildcard_exclusion() {
        let opts = DiscoveryOptions {
            exclude_dirs: vec!["sim*".to_string()],
            ..DiscoveryOptions::default()
        };
        assert!(opts.is_excluded_dir("sim"));
        assert!(opts.is_excluded_dir("Sim_models"));
        assert!(!opts.is_excluded_dir("rtl"));
    }

    #[test]
    fn missing_root_is_error() {
        let err = SourceTree::discover(Path::new("/definitely/not/here"), &DiscoveryOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(relative_path(root, Path::new("/repo/a/b/c.v")), "a/b/c.v");
        assert_eq!(relative_path(root, Path::new("/repo")), "");
    }
}
