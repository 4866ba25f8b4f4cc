//! Merging per-dialect defaults with the user's overrides.

use crate::rules::{convention_prefixes, default_rules, NameRule};
use crate::types::{HdlmapConfig, Weights};
use hdlmap_common::Dialect;

/// A dialect's fully resolved toolchain settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolchainConfig {
    /// The dialect these settings belong to.
    pub dialect: Dialect,
    /// Build descriptor file names, in preference order.
    pub descriptor_names: Vec<String>,
    /// Dependency organization.
    pub organization: String,
    /// Library artifacts.
    pub libraries: Vec<String>,
    /// Compiler plugin artifact.
    pub plugin: Option<String>,
    /// Toolchain version.
    pub version: String,
    /// Scala version.
    pub scala_version: String,
    /// Strings whose presence shows a descriptor declares this toolchain.
    pub dependency_markers: Vec<String>,
    /// Source-root marker paths, most specific first.
    pub source_roots: Vec<String>,
    /// Namespace used when package detection is ambiguous.
    pub default_namespace: String,
    /// Entry-point object name suffix.
    pub entry_suffix: String,
    /// Extra flags for downstream tools.
    pub extra_flags: Vec<String>,
}

impl ToolchainConfig {
    /// Returns the built-in settings for `dialect`.
    pub fn defaults_for(dialect: Dialect) -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut tc = Self {
            dialect,
            descriptor_names: Vec::new(),
            organization: String::new(),
            libraries: Vec::new(),
            plugin: None,
            version: String::new(),
            scala_version: "2.13.12".to_string(),
            dependency_markers: Vec::new(),
            source_roots: strings(&["src/main/scala", "src/main/chisel", "src"]),
            default_namespace: "generated".to_string(),
            entry_suffix: "Main".to_string(),
            extra_flags: Vec::new(),
        };

        match dialect {
            Dialect::Chisel => {
                tc.descriptor_names = strings(&["build.sbt", "build.sc"]);
                tc.organization = "org.chipsalliance".to_string();
                tc.libraries = strings(&["chisel"]);
                tc.plugin = Some("chisel-plugin".to_string());
                tc.version = "6.2.0".to_string();
                tc.dependency_markers = strings(&["chisel"]);
            }
            Dialect::SpinalHdl => {
                tc.descriptor_names = strings(&["build.sbt", "build.sc"]);
                tc.organization = "com.github.spinalhdl".to_string();
                tc.libraries = strings(&["spinalhdl-core", "spinalhdl-lib"]);
                tc.plugin = Some("spinalhdl-idsl-plugin".to_string());
                tc.version = "1.10.1".to_string();
                tc.dependency_markers = strings(&["spinalhdl"]);
            }
            Dialect::Vhdl => {
                tc.extra_flags = strings(&["--std=08"]);
            }
            Dialect::Bluespec | Dialect::SystemVerilog | Dialect::Verilog => {}
        }
        tc
    }
}

/// Resolves the toolchain for `dialect`, overlaying `[dialects.<tag>]`.
pub fn resolve_toolchain(config: &HdlmapConfig, dialect: Dialect) -> ToolchainConfig {
    let mut tc = ToolchainConfig::defaults_for(dialect);
    let Some(o) = config.dialects.get(dialect.tag()) else {
        return tc;
    };

    if let Some(v) = &o.descriptor_names {
        tc.descriptor_names = v.clone();
    }
    if let Some(v) = &o.organization {
        tc.organization = v.clone();
    }
    if let Some(v) = &o.libraries {
        tc.libraries = v.clone();
    }
    if let Some(v) = &o.plugin {
        tc.plugin = if v.is_empty() { None } else { Some(v.clone()) };
    }
    if let Some(v) = &o.version {
        tc.version = v.clone();
    }
    if let Some(v) = &o.scala_version {
        tc.scala_version = v.clone();
    }
    if let Some(v) = &o.dependency_markers {
        tc.dependency_markers = v.clone();
    }
    if let Some(v) = &o.source_roots {
        tc.source_roots = v.clone();
    }
    if let Some(v) = &o.default_namespace {
        tc.default_namespace = v.clone();
    }
    if let Some(v) = &o.entry_suffix {
        tc.entry_suffix = v.clone();
    }
    if let Some(v) = &o.extra_flags {
        tc.extra_flags = v.clone();
    }
    tc
}

/// The heuristic tables handed to the top-module resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// The dialect the rules were selected for.
    pub dialect: Dialect,
    /// Signal weights.
    pub weights: Weights,
    /// Name rules in evaluation order.
    pub rules: Vec<NameRule>,
    /// Conventional top-unit prefixes stripped for name comparison.
    pub strip_prefixes: Vec<String>,
    /// Ties for the best score yield no top.
    pub strict_ties: bool,
}

impl ResolverConfig {
    /// Returns the built-in tables for `dialect`.
    pub fn defaults_for(dialect: Dialect) -> Self {
        Self {
            dialect,
            weights: Weights::default(),
            rules: default_rules(dialect),
            strip_prefixes: convention_prefixes(dialect),
            strict_ties: false,
        }
    }
}

/// Resolves resolver tables for `dialect` from the `[resolver]` section.
///
/// User rules are appended after the built-in rules unless
/// `replace_default_rules` is set. Rules restricted to other dialects are
/// dropped.
pub fn resolve_resolver(config: &HdlmapConfig, dialect: Dialect) -> ResolverConfig {
    let section = &config.resolver;
    let mut rules = if section.replace_default_rules {
        Vec::new()
    } else {
        default_rules(dialect)
    };
    rules.extend(section.rules.iter().filter(|r| r.applies_to(dialect)).cloned());

    ResolverConfig {
        dialect,
        weights: section.weights.clone(),
        rules,
        strip_prefixes: convention_prefixes(dialect),
        strict_ties: section.strict_ties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn chisel_defaults() {
        let tc = ToolchainConfig::defaults_for(Dialect::Chisel);
        assert_eq!(tc.descriptor_names, vec!["build.sbt", "build.sc"]);
        assert_eq!(tc.organization, "org.chipsalliance");
        assert_eq!(tc.default_namespace, "generated");
        assert_eq!(tc.source_roots[0], "src/main/scala");
    }

    #[test]
    fn vhdl_defaults_carry_std_flag() {
        let tc = ToolchainConfig::defaults_for(Dialect::Vhdl);
        assert_eq!(tc.extra_flags, vec!["--std=08"]);
        assert!(tc.descriptor_names.is_empty());
    }

    #[test]
    fn override_merges_field_by_field() {
        let config = load_config_from_str(
            r#"
[dialects.chisel]
version = "3.6.0"
organization = "edu.berkeley.cs"
libraries = ["chisel3"]
plugin = ""
"#,
        )
        .unwrap();
        let tc = resolve_toolchain(&config, Dialect::Chisel);
        assert_eq!(tc.version, "3.6.0");
        assert_eq!(tc.organization, "edu.berkeley.cs");
        assert_eq!(tc.libraries, vec!["chisel3"]);
        assert_eq!(tc.plugin, None);
        assert_eq!(tc.descriptor_names, vec!["build.sbt", "build.sc"]);
    }

    #[test]
    fn user_rules_are_appended_and_filtered() {
        let config = load_config_from_str(
            r#"
[[resolver.rules]]
name = "debug"
pattern = "(^|_)debug($|_)"
weight = -200.0
kind = "negative"

[[resolver.rules]]
name = "vhdl-only"
pattern = "^chip$"
weight = 50.0
dialects = ["vhdl"]
"#,
        )
        .unwrap();
        let verilog = resolve_resolver(&config, Dialect::Verilog);
        assert!(verilog.rules.iter().any(|r| r.name == "debug"));
        assert!(!verilog.rules.iter().any(|r| r.name == "vhdl-only"));
        assert!(verilog.rules.iter().any(|r| r.name == "top"));

        let vhdl = resolve_resolver(&config, Dialect::Vhdl);
        assert!(vhdl.rules.iter().any(|r| r.name == "vhdl-only"));
    }

    #[test]
    fn replace_default_rules() {
        let config = load_config_from_str(
            r#"
[resolver]
replace_default_rules = true
strict_ties = true
"#,
        )
        .unwrap();
        let rc = resolve_resolver(&config, Dialect::Bluespec);
        assert!(rc.rules.is_empty());
        assert!(rc.strict_ties);
        assert_eq!(rc.strip_prefixes, vec!["mk"]);
    }
}
