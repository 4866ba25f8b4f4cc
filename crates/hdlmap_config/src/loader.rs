//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::HdlmapConfig;
use hdlmap_common::Dialect;
use std::path::Path;

/// The configuration file name looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "hdlmap.toml";

/// Loads and validates `<dir>/hdlmap.toml`.
pub fn load_config(dir: &Path) -> Result<HdlmapConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<HdlmapConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Loads `<dir>/hdlmap.toml` if it exists, otherwise returns the defaults.
pub fn load_config_or_default(dir: &Path) -> Result<HdlmapConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.is_file() {
        load_config_file(&path)
    } else {
        Ok(HdlmapConfig::default())
    }
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<HdlmapConfig, ConfigError> {
    let config: HdlmapConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks value ranges, rule patterns and dialect keys.
fn validate_config(config: &HdlmapConfig) -> Result<(), ConfigError> {
    for key in config.dialects.keys() {
        key.parse::<Dialect>()
            .map_err(|_| ConfigError::UnknownDialect(key.clone()))?;
    }

    let weights = &config.resolver.weights;
    for (name, value) in weights.named_values() {
        if !value.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "resolver.weights.{name} must be a finite number"
            )));
        }
    }
    if !(0.0..=1.0).contains(&weights.fuzzy_threshold) {
        return Err(ConfigError::ValidationError(
            "resolver.weights.fuzzy_threshold must be between 0 and 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&weights.repo_substring_min_scale) {
        return Err(ConfigError::ValidationError(
            "resolver.weights.repo_substring_min_scale must be between 0 and 1".to_string(),
        ));
    }

    for rule in &config.resolver.rules {
        if rule.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "resolver.rules entries need a name".to_string(),
            ));
        }
        if !rule.weight.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "rule '{}' has a non-finite weight",
                rule.name
            )));
        }
        regex::Regex::new(&rule.pattern).map_err(|e| {
            ConfigError::ValidationError(format!("rule '{}' has an invalid pattern: {e}", rule.name))
        })?;
    }

    if config.compile.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "compile.timeout_secs must be greater than zero".to_string(),
        ));
    }
    if config.batch.jobs == Some(0) {
        return Err(ConfigError::ValidationError(
            "batch.jobs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_all_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.resolver.weights.repo_exact, 1000.0);
        assert!(!config.resolver.strict_ties);
        assert_eq!(config.compile.timeout_secs, 300);
        assert_eq!(config.output.default_march, "rv32i");
        assert!(config.discovery.exclude_dirs.iter().any(|d| d == "vendor"));
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[discovery]
exclude_dirs = ["build", "sim*"]
header_extensions = ["vh", "svh"]

[resolver]
strict_ties = true

[resolver.weights]
floor = 10.0
fan_out_cap = 8

[[resolver.rules]]
name = "harness"
pattern = "harness"
weight = -500.0
kind = "negative"

[dialects.spinalhdl]
version = "1.9.4"

[compile]
command = "verilator"
args = ["--lint-only", "--top-module", "{top}", "{files}"]
timeout_secs = 60

[batch]
jobs = 4

[output]
default_march = "rv64imac"
pretty = false
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.discovery.exclude_dirs, vec!["build", "sim*"]);
        assert!(config.resolver.strict_ties);
        assert_eq!(config.resolver.weights.floor, 10.0);
        assert_eq!(config.resolver.weights.fan_out_cap, 8);
        assert_eq!(config.resolver.rules.len(), 1);
        assert_eq!(config.dialects["spinalhdl"].version.as_deref(), Some("1.9.4"));
        assert_eq!(config.compile.command.as_deref(), Some("verilator"));
        assert_eq!(config.compile.args.len(), 4);
        assert_eq!(config.batch.jobs, Some(4));
        assert_eq!(config.output.default_march, "rv64imac");
        assert!(!config.output.pretty);
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_section_errors() {
        let err = load_config_from_str("[project]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_dialect_key_errors() {
        let err = load_config_from_str("[dialects.myhdl]\nversion = \"1\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDialect(ref d) if d == "myhdl"));
    }

    #[test]
    fn bad_rule_pattern_errors() {
        let toml = r#"
[[resolver.rules]]
name = "broken"
pattern = "(unclosed"
weight = 1.0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("rule 'broken'"));
    }

    #[test]
    fn out_of_range_threshold_errors() {
        let err = load_config_from_str("[resolver.weights]\nfuzzy_threshold = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_jobs_errors() {
        let err = load_config_from_str("[batch]\njobs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_file_in_dir_errors() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn or_default_without_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = load_config_or_default(tmp.path()).unwrap();
        assert_eq!(config.resolver.weights.zero_fan_in, 200.0);

        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "[batch]\njobs = 2\n").unwrap();
        let config = load_config_or_default(tmp.path()).unwrap();
        assert_eq!(config.batch.jobs, Some(2));
    }
}
