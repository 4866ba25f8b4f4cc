//! Content hashing for change detection on generated files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit content hash computed using XXH3.
///
/// Two buffers with the same `ContentHash` are assumed to have identical
/// content. The descriptor locator compares hashes to decide whether an
/// existing generated file can be reused instead of written again.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Computes a content hash of a string, ignoring `\r` so that files
    /// checked out with CRLF line endings hash like their LF originals.
    pub fn from_text(text: &str) -> Self {
        if text.contains('\r') {
            let normalized: String = text.chars().filter(|&c| c != '\r').collect();
            Self::from_bytes(normalized.as_bytes())
        } else {
            Self::from_bytes(text.as_bytes())
        }
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}
