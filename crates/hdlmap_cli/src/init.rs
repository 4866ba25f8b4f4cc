//! `hdlmap init`: writes a documented default `hdlmap.toml`.

use std::fs;
use std::path::PathBuf;

use hdlmap_config::CONFIG_FILE_NAME;

/// The file written by `hdlmap init`. Every active value equals the built-in
/// default, so writing it changes nothing until it is edited.
pub const DEFAULT_CONFIG: &str = r#"# hdlmap configuration. Every section is optional; the values below are the
# built-in defaults.

[discovery]
# Directory names (glob patterns allowed) skipped in addition to the built-in
# list of VCS, build output and vendor directories.
extra_exclude_dirs = []

[resolver]
# Report "ambiguous top" instead of breaking a tie by file path and name.
strict_ties = false
# Drop the built-in name rules and use only the [[resolver.rules]] below.
replace_default_rules = false

[resolver.weights]
# Candidates must score above the floor to be chosen.
floor = 0.0
# Match between the module name and the repository name.
repo_exact = 1000.0
repo_substring = 250.0
repo_substring_min_scale = 0.5
repo_fuzzy = 200.0
fuzzy_threshold = 0.7
# Hierarchy position.
zero_fan_in = 200.0
fan_in_threshold = 2
fan_in_penalty = 15.0
fan_out_weight = 40.0
fan_out_cap = 12
# Declaration attributes.
synthesizable = 150.0
simulation_only = -600.0
no_ports = -100.0
blackbox = -500.0
interface_affinity = 50.0

# Extra name rules match the snake_cased module name. Negative rules also
# demote the candidate below every unflagged one.
#
# [[resolver.rules]]
# name = "soc-wrapper"
# pattern = "^soc_wrapper$"
# weight = 200.0
# kind = "convention"

# Per-dialect toolchain overrides; unset keys keep the defaults.
#
# [dialects.chisel]
# version = "6.2.0"
# default_namespace = "generated"
#
# [dialects.verilog]
# extra_flags = ["-Wall"]

[compile]
# Program run by `hdlmap analyze --compile`. Arguments may use {top}, {out},
# {files} and {include_dirs}.
# command = "iverilog"
# args = ["-s", "{top}", "-o", "{out}/{top}.vvp", "{files}"]
timeout_secs = 300
out_dir = "build/hdlmap"

[batch]
# Worker threads; defaults to the available parallelism.
# jobs = 8

[output]
default_march = "rv32i"
pretty = true
"#;

/// Writes `hdlmap.toml` into `dir` (default: the current directory).
///
/// Refuses to overwrite an existing file.
pub fn run(dir: Option<String>) -> Result<i32, Box<dyn std::error::Error>> {
    let dir = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(format!("'{}' already exists", path.display()).into());
    }
    fs::create_dir_all(&dir)?;
    fs::write(&path, DEFAULT_CONFIG)?;
    eprintln!("     Created {}", path.display());
    Ok(0)
}
