//! The output record.

use serde::{Deserialize, Serialize};

/// A module and its declaring file.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Module name.
    pub module: String,
    /// Declaring file, relative to the project root.
    pub file: String,
}

/// Everything a downstream simulation or synthesis flow needs to build a
/// processor repository.
///
/// Paths are relative to the project root with `/` separators and every
/// list is sorted or has a documented order, so two descriptors can be
/// compared field by field. Optional fields are omitted from JSON when unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigDescriptor {
    /// Project name.
    pub name: String,
    /// Root directory name.
    pub folder: String,
    /// Repository URL, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Dialect tag.
    pub language: String,
    /// Resolved top module.
    pub top_module: String,
    /// Synthesis files: the top's file first, then the hierarchy's files,
    /// then imported package files.
    pub files: Vec<String>,
    /// Testbench files not already in `files`.
    pub sim_files: Vec<String>,
    /// Include search directories.
    pub include_dirs: Vec<String>,
    /// Declared interface names.
    pub interfaces: Vec<String>,
    /// Every declared module in (file, name) order.
    pub modules: Vec<ModuleEntry>,
    /// The design can be simulated as assembled.
    pub is_simulable: bool,
    /// Target ISA string (text dialects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub march: Option<String>,
    /// The top exposes separate instruction and data memory ports (text
    /// dialects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_memory: Option<bool>,
    /// Extra tool flags (text dialects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_flags: Option<Vec<String>>,
    /// Language standard (text dialects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_version: Option<String>,
    /// Build descriptor path (namespace dialects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_sbt: Option<String>,
    /// Entry-point path (namespace dialects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_app: Option<String>,
    /// Entry-point namespace (namespace dialects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ConfigDescriptor {
    /// Serializes to JSON.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigDescriptor {
        ConfigDescriptor {
            name: "picorv32".to_string(),
            folder: "picorv32".to_string(),
            repository: None,
            language: "verilog".to_string(),
            top_module: "picorv32".to_string(),
            files: vec!["picorv32.v".to_string()],
            sim_files: Vec::new(),
            include_dirs: Vec::new(),
            interfaces: Vec::new(),
            modules: vec![ModuleEntry {
                module: "picorv32".to_string(),
                file: "picorv32.v".to_string(),
            }],
            is_simulable: true,
            march: Some("rv32imc".to_string()),
            two_memory: Some(false),
            extra_flags: Some(Vec::new()),
            language_version: Some("2005".to_string()),
            build_sbt: None,
            main_app: None,
            namespace: None,
        }
    }

    #[test]
    fn absent_fields_are_omitted() {
        let json = sample().to_json(false).unwrap();
        assert!(!json.contains("repository"));
        assert!(!json.contains("build_sbt"));
        assert!(json.contains("\"march\":\"rv32imc\""));
    }

    #[test]
    fn json_reads_back() {
        let d = sample();
        let back: ConfigDescriptor = serde_json::from_str(&d.to_json(true).unwrap()).unwrap();
        assert_eq!(back, d);
    }
}
