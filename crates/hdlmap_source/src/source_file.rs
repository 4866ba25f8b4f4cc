//! Source file representation with line-start indexing.

use crate::file_id::FileId;
use std::path::PathBuf;

/// A source file loaded into an analysis run.
///
/// Stores the decoded text together with its path relative to the project
/// root and precomputed line-start offsets for line/column resolution.
pub struct SourceFile {
    /// The unique identifier for this file within the [`SourceDb`](crate::SourceDb).
    pub id: FileId,
    /// The filesystem path of this file (or a synthetic name for in-memory sources).
    pub path: PathBuf,
    /// The path relative to the project root, with `/` separators.
    pub relative: String,
    /// The full text content of the file.
    pub content: String,
    /// Whether invalid UTF-8 had to be replaced while decoding.
    pub lossy: bool,
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Creates a new `SourceFile` with precomputed line starts.
    pub fn new(id: FileId, path: PathBuf, relative: String, content: String) -> Self {
        let line_starts = compute_line_starts(&content);
        Self {
            id,
            path,
            relative,
            content,
            lossy: false,
            line_starts,
        }
    }

    /// Converts a byte offset into 1-indexed (line, column) coordinates.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line = (line_idx as u32) + 1;
        let col = byte_offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Returns the 1-indexed line number containing `byte_offset`.
    pub fn line_of(&self, byte_offset: u32) -> u32 {
        self.line_col(byte_offset).0
    }

    /// Returns the text of the line containing `byte_offset`, without the newline.
    pub fn line_text(&self, byte_offset: u32) -> &str {
        let offset = (byte_offset as usize).min(self.content.len());
        let start = self.content[..offset].rfind('\n').map_or(0, |pos| pos + 1);
        let end = self.content[offset..]
            .find('\n')
            .map_or(self.content.len(), |pos| offset + pos);
        self.content[start..end].trim_end_matches('\r')
    }

    /// Returns a substring of the file content between byte offsets.
    pub fn snippet(&self, start: u32, end: u32) -> &str {
        &self.content[start as usize..end as usize]
    }
}

/// Computes the byte offsets of each line start in the given content.
fn compute_line_starts(content: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_file(content: &str) -> SourceFile {
        SourceFile::new(
            FileId::from_raw(0),
            PathBuf::from("/repo/rtl/core.v"),
            "rtl/core.v".to_string(),
            content.to_string(),
        )
    }

    #[test]
    fn line_col_resolution() {
        let f = make_file("module a;\nendmodule\n");
        assert_eq!(f.line_col(0), (1, 1));
        assert_eq!(f.line_col(10), (2, 1));
        assert_eq!(f.line_col(13), (2, 4));
    }

    #[test]
    fn line_text_strips_cr() {
        let f = make_file("module a;\r\n  wire x;\r\nendmodule");
        assert_eq!(f.line_text(0), "module a;");
        assert_eq!(f.line_text(13), "  wire x;");
        assert_eq!(f.line_of(13), 2);
    }

    #[test]
    fn empty_file() {
        let f = make_file("");
        assert_eq!(f.line_col(0), (1, 1));
        assert_eq!(f.line_text(0), "");
    }
}
