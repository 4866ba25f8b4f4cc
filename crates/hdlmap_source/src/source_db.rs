//! Central database of all source files loaded for one analysis run.

use crate::file_id::FileId;
use crate::resolved_span::ResolvedSpan;
use crate::source_file::SourceFile;
use crate::span::Span;
use crate::tree::relative_path;
use std::io;
use std::path::{Path, PathBuf};

/// The source database, owning all loaded source text.
///
/// One `SourceDb` belongs to exactly one analysis run; nothing is shared
/// between runs, which keeps concurrent analyses independent.
pub struct SourceDb {
    root: PathBuf,
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty source database for the project rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Vec::new(),
        }
    }

    /// Returns the project root this database resolves relative paths against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads a source file from the filesystem and returns its [`FileId`].
    ///
    /// Invalid UTF-8 is replaced rather than rejected (HDL sources often carry
    /// Latin-1 comments); such files are marked [`SourceFile::lossy`].
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let bytes = std::fs::read(path)?;
        let (content, lossy) = match String::from_utf8(bytes) {
            Ok(s) => (s, false),
            Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
        };
        let id = FileId::from_raw(self.files.len() as u32);
        let mut file = SourceFile::new(
            id,
            path.to_path_buf(),
            relative_path(&self.root, path),
            content,
        );
        file.lossy = lossy;
        self.files.push(file);
        Ok(id)
    }

    /// Adds a source file from an in-memory string (useful for tests).
    ///
    /// `name` is used both as the path and as the relative display path.
    pub fn add_source(&mut self, name: &str, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        let file = SourceFile::new(id, self.root.join(name), name.replace('\\', "/"), content);
        self.files.push(file);
        id
    }

    /// Returns the [`SourceFile`] for the given [`FileId`].
    ///
    /// # Panics
    ///
    /// Panics if the `FileId` is invalid.
    pub fn get_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.as_raw() as usize]
    }

    /// Returns the file with the given relative path, if loaded.
    pub fn find_relative(&self, relative: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.relative == relative)
    }

    /// Iterates over all loaded files in load order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    /// Returns the number of loaded files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no files are loaded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Resolves a [`Span`] to a relative path plus line/column.
    pub fn resolve_span(&self, span: Span) -> ResolvedSpan {
        let file = self.get_file(span.file);
        let (line, col) = file.line_col(span.start);
        ResolvedSpan {
            file: file.relative.clone(),
            line,
            col,
        }
    }
}
