//! Shared plumbing for the subcommands: configuration lookup, diagnostic
//! rendering and candidate tables.

use std::path::Path;

use hdlmap_config::{load_config_file, load_config_or_default, ConfigError, HdlmapConfig};
use hdlmap_diagnostics::{Diagnostic, DiagnosticRenderer, Severity, TerminalRenderer};
use hdlmap_resolve::ScoredCandidate;
use hdlmap_source::SourceDb;

use crate::GlobalArgs;

/// Loads `--config` when given, else `<root>/hdlmap.toml`, else the defaults.
pub fn load_config(global: &GlobalArgs, root: &Path) -> Result<HdlmapConfig, ConfigError> {
    match &global.config {
        Some(path) => load_config_file(Path::new(path)),
        None => load_config_or_default(root),
    }
}

/// Renders `diags` in emission order.
pub fn render_diagnostics(diags: &[Diagnostic], db: &SourceDb, color: bool) -> String {
    TerminalRenderer::new(color).render_all(diags, db)
}

/// Prints diagnostics to stderr; only errors when `quiet`.
pub fn print_diagnostics(diags: &[Diagnostic], db: &SourceDb, global: &GlobalArgs) {
    let shown: Vec<Diagnostic> = diags
        .iter()
        .filter(|d| !global.quiet || d.severity == Severity::Error)
        .cloned()
        .collect();
    if !shown.is_empty() {
        eprint!("{}", render_diagnostics(&shown, db, global.color));
    }
}

/// One line per candidate: score, name, file and contributing signals.
pub fn candidate_table(candidates: &[ScoredCandidate]) -> String {
    let width = candidates.iter().map(|c| c.module.len()).max().unwrap_or(0);
    let mut out = String::new();
    for c in candidates {
        let flag = if c.flagged { "!" } else { " " };
        out.push_str(&format!(
            "{:>9.1}{flag} {:<width$}  {}  {}\n",
            c.total_score,
            c.module,
            c.declaring_file,
            c.explain()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(module: &str, score: f64, flagged: bool) -> ScoredCandidate {
        ScoredCandidate {
            module: module.to_string(),
            declaring_file: format!("rtl/{module}.v"),
            total_score: score,
            contributing_signals: Vec::new(),
            flagged,
        }
    }

    #[test]
    fn table_aligns_names() {
        let table = candidate_table(&[candidate("core", 930.0, false), candidate("uart_tx", -200.0, true)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("    930.0  core     "));
        assert!(lines[1].contains("-200.0! uart_tx"));
    }

    #[test]
    fn explicit_config_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[resolver]\nstrict_ties = true\n").unwrap();
        let global = GlobalArgs {
            quiet: false,
            verbose: false,
            color: false,
            config: Some(path.to_string_lossy().into_owned()),
        };
        assert!(load_config(&global, dir.path()).unwrap().resolver.strict_ties);
    }
}
