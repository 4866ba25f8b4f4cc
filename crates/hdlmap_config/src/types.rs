//! Configuration types deserialized from `hdlmap.toml`.

use crate::rules::NameRule;
use hdlmap_source::DiscoveryOptions;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level configuration parsed from `hdlmap.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HdlmapConfig {
    /// Source discovery settings.
    pub discovery: DiscoveryConfig,
    /// Top-module resolver weights and name rules.
    pub resolver: ResolverSection,
    /// Per-dialect toolchain overrides keyed by dialect tag.
    pub dialects: BTreeMap<String, ToolchainOverride>,
    /// Compile collaborator settings.
    pub compile: CompileConfig,
    /// Batch runner settings.
    pub batch: BatchConfig,
    /// Output defaults.
    pub output: OutputConfig,
}

/// `[discovery]`: which directories and files the source walk considers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directory names to prune, replacing the built-in list.
    pub exclude_dirs: Vec<String>,
    /// Directory names to prune in addition to `exclude_dirs`.
    pub extra_exclude_dirs: Vec<String>,
    /// Header extensions collected for include-directory reporting.
    pub header_extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let defaults = DiscoveryOptions::default();
        Self {
            exclude_dirs: defaults.exclude_dirs,
            extra_exclude_dirs: Vec::new(),
            header_extensions: defaults.header_extensions,
        }
    }
}

impl DiscoveryConfig {
    /// Converts this section into walker options.
    pub fn to_options(&self) -> DiscoveryOptions {
        let mut exclude_dirs = self.exclude_dirs.clone();
        exclude_dirs.extend(self.extra_exclude_dirs.iter().cloned());
        DiscoveryOptions {
            exclude_dirs,
            header_extensions: self.header_extensions.clone(),
            ..DiscoveryOptions::default()
        }
    }
}

/// `[resolver]`: scoring weights, tie handling and extra name rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    /// Signal weights.
    pub weights: Weights,
    /// Treat a tie for the best score as "no top found" instead of breaking it.
    pub strict_ties: bool,
    /// Drop the built-in name rules and use only `rules`.
    pub replace_default_rules: bool,
    /// Additional name rules (`[[resolver.rules]]`).
    pub rules: Vec<NameRule>,
}

/// Numeric weights of the top-module scoring signals.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// A winner must score strictly above this value.
    pub floor: f64,
    /// Name equals the repository name after normalization.
    pub repo_exact: f64,
    /// One of name and repository name contains the other.
    pub repo_substring: f64,
    /// Lower bound of the length-ratio scaling applied to `repo_substring`.
    pub repo_substring_min_scale: f64,
    /// Multiplied by the normalized edit similarity when it reaches `fuzzy_threshold`.
    pub repo_fuzzy: f64,
    /// Minimum normalized similarity for the fuzzy bonus.
    pub fuzzy_threshold: f64,
    /// Module is never instantiated in the project.
    pub zero_fan_in: f64,
    /// Parent count above which each extra parent costs `fan_in_penalty`.
    pub fan_in_threshold: u32,
    /// Penalty per parent above `fan_in_threshold`.
    pub fan_in_penalty: f64,
    /// Bonus per distinct resolved child.
    pub fan_out_weight: f64,
    /// Children beyond this count earn nothing.
    pub fan_out_cap: u32,
    /// Declaration carries a synthesize annotation.
    pub synthesizable: f64,
    /// Declaration contains simulation-only constructs.
    pub simulation_only: f64,
    /// Declaration has no port list.
    pub no_ports: f64,
    /// Declaration is a black box.
    pub blackbox: f64,
    /// Name matches a declared interface.
    pub interface_affinity: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            floor: 0.0,
            repo_exact: 1000.0,
            repo_substring: 250.0,
            repo_substring_min_scale: 0.5,
            repo_fuzzy: 200.0,
            fuzzy_threshold: 0.7,
            zero_fan_in: 200.0,
            fan_in_threshold: 2,
            fan_in_penalty: 15.0,
            fan_out_weight: 40.0,
            fan_out_cap: 12,
            synthesizable: 150.0,
            simulation_only: -600.0,
            no_ports: -100.0,
            blackbox: -500.0,
            interface_affinity: 50.0,
        }
    }
}

impl Weights {
    /// Returns every floating-point weight with its key, for validation.
    pub(crate) fn named_values(&self) -> [(&'static str, f64); 14] {
        [
            ("floor", self.floor),
            ("repo_exact", self.repo_exact),
            ("repo_substring", self.repo_substring),
            ("repo_substring_min_scale", self.repo_substring_min_scale),
            ("repo_fuzzy", self.repo_fuzzy),
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("zero_fan_in", self.zero_fan_in),
            ("fan_in_penalty", self.fan_in_penalty),
            ("fan_out_weight", self.fan_out_weight),
            ("synthesizable", self.synthesizable),
            ("simulation_only", self.simulation_only),
            ("no_ports", self.no_ports),
            ("blackbox", self.blackbox),
            ("interface_affinity", self.interface_affinity),
        ]
    }
}

/// `[dialects.<tag>]`: partial override of a dialect's toolchain defaults.
///
/// Unset fields keep the built-in value for that dialect.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainOverride {
    /// Build descriptor file names searched for, in preference order.
    pub descriptor_names: Option<Vec<String>>,
    /// Dependency organization written into synthesized descriptors.
    pub organization: Option<String>,
    /// Library artifacts written into synthesized descriptors.
    pub libraries: Option<Vec<String>>,
    /// Compiler plugin artifact, if the toolchain needs one.
    pub plugin: Option<String>,
    /// Toolchain version.
    pub version: Option<String>,
    /// Scala version written into synthesized descriptors.
    pub scala_version: Option<String>,
    /// Strings whose presence in a descriptor shows it declares the toolchain.
    pub dependency_markers: Option<Vec<String>>,
    /// Source-root marker paths, most specific first.
    pub source_roots: Option<Vec<String>>,
    /// Namespace used when package detection is ambiguous.
    pub default_namespace: Option<String>,
    /// Suffix appended to the top name to form the entry-point object name.
    pub entry_suffix: Option<String>,
    /// Extra flags passed to downstream tools.
    #[serde(deserialize_with = "deserialize_opt_string_or_vec")]
    pub extra_flags: Option<Vec<String>>,
}

/// `[compile]`: the external compile command.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Program to run. Unset disables `--compile`.
    pub command: Option<String>,
    /// Argument template; `{top}`, `{files}`, `{include_dirs}` and `{out}` are expanded.
    pub args: Vec<String>,
    /// Seconds before the compile is killed and recorded as a timeout.
    pub timeout_secs: u64,
    /// Output directory, relative to the project root.
    pub out_dir: String,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: 300,
            out_dir: "build/hdlmap".to_string(),
        }
    }
}

/// `[batch]`: defaults for the batch runner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker count; unset means available parallelism.
    pub jobs: Option<usize>,
}

/// `[output]`: defaults for assembled descriptors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// ISA string used when none is found in the sources.
    pub default_march: String,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_march: "rv32i".to_string(),
            pretty: true,
        }
    }
}

/// Deserializes an optional field that can be a single string or a list.
///
/// Allows both `extra_flags = "--std=08"` and `extra_flags = ["-g2012", "-Wall"]`.
fn deserialize_opt_string_or_vec<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec).map(Some)
}

#[cfg(test)]
mod tests {
    use crate::loader::load_config_from_str;

    #[test]
    fn extra_flags_single_string() {
        let config = load_config_from_str(
            r#"
[dialects.vhdl]
extra_flags = "--std=93"
"#,
        )
        .unwrap();
        assert_eq!(
            config.dialects["vhdl"].extra_flags.as_deref(),
            Some(&["--std=93".to_string()][..])
        );
    }

    #[test]
    fn extra_flags_list() {
        let config = load_config_from_str(
            r#"
[dialects.systemverilog]
extra_flags = ["-g2012", "-Wall"]
"#,
        )
        .unwrap();
        assert_eq!(
            config.dialects["systemverilog"].extra_flags,
            Some(vec!["-g2012".to_string(), "-Wall".to_string()])
        );
    }

    #[test]
    fn discovery_extra_excludes_are_appended() {
        let config = load_config_from_str(
            r#"
[discovery]
extra_exclude_dirs = ["fpga*"]
"#,
        )
        .unwrap();
        let opts = config.discovery.to_options();
        assert!(opts.is_excluded_dir("build"));
        assert!(opts.is_excluded_dir("fpga_boards"));
    }

    #[test]
    fn partial_weights_keep_defaults() {
        let config = load_config_from_str(
            r#"
[resolver.weights]
zero_fan_in = 50.0
"#,
        )
        .unwrap();
        assert_eq!(config.resolver.weights.zero_fan_in, 50.0);
        assert_eq!(config.resolver.weights.repo_exact, 1000.0);
        assert_eq!(config.resolver.weights.fan_out_cap, 12);
    }
}
