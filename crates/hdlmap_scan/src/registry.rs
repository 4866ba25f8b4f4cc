//! Capability-keyed scanner registry.

use std::collections::BTreeMap;

use hdlmap_common::{Dialect, HdlResult};

use crate::scanner::Scanner;
use crate::scanners::register_builtin_scanners;

/// Maps dialect tags to their scanners.
///
/// The registry is built once and consulted once per project, after the
/// project dialect has been selected.
pub struct ScannerRegistry {
    scanners: BTreeMap<&'static str, Box<dyn Scanner>>,
}

impl ScannerRegistry {
    /// Creates a registry holding every built-in scanner.
    ///
    /// Fails only if a built-in pattern does not compile, which is a bug.
    pub fn new() -> HdlResult<Self> {
        let mut registry = Self::empty();
        register_builtin_scanners(&mut registry)?;
        Ok(registry)
    }

    /// Creates a registry with no scanners.
    pub fn empty() -> Self {
        Self {
            scanners: BTreeMap::new(),
        }
    }

    /// Registers a scanner under its dialect's tag, replacing any previous one.
    pub fn register(&mut self, scanner: Box<dyn Scanner>) {
        self.scanners.insert(scanner.dialect().tag(), scanner);
    }

    /// Returns the scanner for `dialect`, if registered.
    pub fn get(&self, dialect: Dialect) -> Option<&dyn Scanner> {
        self.scanners.get(dialect.tag()).map(|s| s.as_ref())
    }

    /// Returns the registered dialect tags in sorted order.
    pub fn tags(&self) -> Vec<&'static str> {
        self.scanners.keys().copied().collect()
    }

    /// Returns the number of registered scanners.
    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    /// Returns `true` if no scanners are registered.
    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dialect_has_a_scanner() {
        let registry = ScannerRegistry::new().unwrap();
        assert_eq!(registry.len(), Dialect::ALL.len());
        for d in Dialect::ALL {
            let scanner = registry.get(d).unwrap();
            assert_eq!(scanner.dialect(), d);
        }
    }

    #[test]
    fn empty_registry() {
        let registry = ScannerRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.get(Dialect::Verilog).is_none());
    }

    #[test]
    fn tags_sorted() {
        let tags = ScannerRegistry::new().unwrap().tags();
        let mut sorted = tags.clone();
        sorted.sort();
        assert_eq!(tags, sorted);
    }
}
