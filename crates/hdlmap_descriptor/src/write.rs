//! Atomic, no-clobber file creation.

use std::io::{self, Write};
use std::path::Path;

use hdlmap_common::ContentHash;
use tempfile::NamedTempFile;

use crate::error::DescriptorError;

/// What [`write_new`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created.
    Created,
    /// An identical file was already there.
    Reused,
}

/// Creates `path` with `content`, never replacing an existing file.
///
/// The content goes to a temporary file in the destination directory first
/// and is then linked into place with a no-clobber rename, so an interrupted
/// run leaves either nothing or the complete file. An existing file with the
/// same content (ignoring `\r`) is reused; a different one is an error.
pub fn write_new(path: &Path, content: &str) -> Result<WriteOutcome, DescriptorError> {
    if let Some(outcome) = compare_existing(path, content)? {
        return Ok(outcome);
    }

    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| DescriptorError::from_io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| DescriptorError::from_io(dir, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| DescriptorError::from_io(tmp.path(), e))?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(WriteOutcome::Created),
        // Someone else created it between the check and the rename.
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => compare_existing(path, content)?
            .ok_or_else(|| DescriptorError::from_io(path, err.error)),
        Err(err) => Err(DescriptorError::from_io(path, err.error)),
    }
}

fn compare_existing(path: &Path, content: &str) -> Result<Option<WriteOutcome>, DescriptorError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let existing = String::from_utf8_lossy(&bytes);
            if ContentHash::from_text(&existing) == ContentHash::from_text(content) {
                Ok(Some(WriteOutcome::Reused))
            } else {
                Err(DescriptorError::Exists {
                    path: path.to_path_buf(),
                })
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DescriptorError::from_io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/build.sbt");
        assert_eq!(write_new(&path, "x := 1\n").unwrap(), WriteOutcome::Created);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x := 1\n");
        assert_eq!(write_new(&path, "x := 1\r\n").unwrap(), WriteOutcome::Reused);
    }

    #[test]
    fn never_overwrites_different_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.sbt");
        std::fs::write(&path, "user content").unwrap();
        let err = write_new(&path, "generated").unwrap_err();
        assert!(matches!(err, DescriptorError::Exists { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "user content");
    }

    #[test]
    fn leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Main.scala");
        write_new(&path, "object Main").unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["Main.scala"]);
    }
}
