//! Scoring and selection.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use hdlmap_config::{ResolverConfig, RuleKind};
use hdlmap_diagnostics::{codes, Diagnostic, DiagnosticSink};
use hdlmap_graph::DependencyGraph;
use hdlmap_scan::{Interface, Module, ModuleAttribute};
use hdlmap_source::Span;
use regex::Regex;

use crate::candidate::{ResolvedTop, ScoredCandidate};
use crate::error::ResolveError;
use crate::names::{normalize, similarity, snake_case};

const SCORE_EPSILON: f64 = 1e-9;

/// Suffixes dropped from interface names before comparing them to modules.
const INTERFACE_SUFFIXES: &[&str] = &["interface", "ifc", "io", "if"];

struct CompiledRule {
    name: String,
    regex: Regex,
    weight: f64,
    kind: RuleKind,
}

/// The outcome of resolving one project.
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    /// The chosen top, if any.
    pub top: Option<ResolvedTop>,
    /// Every candidate, best first.
    pub candidates: Vec<ScoredCandidate>,
    /// Candidates sharing the best score in the winning tier, when more
    /// than one did.
    pub tied: Vec<ScoredCandidate>,
    /// The top came from an explicit override.
    pub overridden: bool,
}

impl Resolution {
    /// Returns `true` if a tie left the project without a top.
    pub fn is_ambiguous(&self) -> bool {
        self.top.is_none() && !self.tied.is_empty()
    }
}

/// Scores modules and selects the top.
pub struct TopResolver {
    config: ResolverConfig,
    rules: Vec<CompiledRule>,
}

impl TopResolver {
    /// Compiles the name rules of `config`.
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        let rules = config
            .rules
            .iter()
            .map(|r| {
                Ok(CompiledRule {
                    name: r.name.clone(),
                    regex: Regex::new(&r.pattern).map_err(|source| ResolveError::InvalidRule {
                        name: r.name.clone(),
                        source,
                    })?,
                    weight: r.weight,
                    kind: r.kind,
                })
            })
            .collect::<Result<Vec<_>, ResolveError>>()?;
        Ok(Self { config, rules })
    }

    /// The tables this resolver was built from.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn interface_key(&self, name: &str) -> String {
        let mut key = normalize(name, &self.config.strip_prefixes);
        for suffix in INTERFACE_SUFFIXES {
            if let Some(rest) = key.strip_suffix(suffix) {
                if !rest.is_empty() {
                    key = rest.to_string();
                    break;
                }
            }
        }
        key
    }

    /// Scores one module record.
    pub fn score(
        &self,
        module: &Module,
        graph: &DependencyGraph,
        interface_keys: &BTreeSet<String>,
        repo_hint: Option<&str>,
    ) -> ScoredCandidate {
        let w = &self.config.weights;
        let mut c = ScoredCandidate::new(&module.name, &module.file);
        let norm = normalize(&module.name, &self.config.strip_prefixes);

        if let Some(repo) = repo_hint
            .map(|r| normalize(r, &self.config.strip_prefixes))
            .filter(|r| !r.is_empty())
        {
            if norm == repo {
                c.add("repo-exact", w.repo_exact);
            } else {
                let (short, long) = if norm.len() <= repo.len() {
                    (&norm, &repo)
                } else {
                    (&repo, &norm)
                };
                if short.len() >= 3 && long.contains(short.as_str()) {
                    let scale = (short.len() as f64 / long.len() as f64).max(w.repo_substring_min_scale);
                    c.add("repo-substring", w.repo_substring * scale);
                } else {
                    let sim = similarity(&norm, &repo);
                    if sim >= w.fuzzy_threshold {
                        c.add("repo-fuzzy", w.repo_fuzzy * sim);
                    }
                }
            }
        }

        let snake = snake_case(&module.name);
        for rule in &self.rules {
            if rule.regex.is_match(&snake) {
                c.add(format!("rule:{}", rule.name), rule.weight);
                if rule.kind == RuleKind::Negative {
                    c.flagged = true;
                }
            }
        }

        let fan_in = graph.fan_in(&module.name);
        if fan_in == 0 {
            c.add("zero-fan-in", w.zero_fan_in);
        } else if fan_in > w.fan_in_threshold as usize {
            let extra = (fan_in - w.fan_in_threshold as usize) as f64;
            c.add("fan-in", -w.fan_in_penalty * extra);
        }

        let fan_out = graph.fan_out(&module.name).min(w.fan_out_cap as usize);
        c.add("fan-out", w.fan_out_weight * fan_out as f64);

        let attributes = [
            (ModuleAttribute::Synthesize, "synthesize", w.synthesizable),
            (ModuleAttribute::SimulationOnly, "simulation-only", w.simulation_only),
            (ModuleAttribute::NoPorts, "no-ports", w.no_ports),
            (ModuleAttribute::Blackbox, "blackbox", w.blackbox),
        ];
        for (attr, name, value) in attributes {
            if module.has(attr) {
                c.add(name, value);
            }
        }

        if interface_keys.contains(&norm) {
            c.add("interface-affinity", w.interface_affinity);
        }

        tracing::debug!(
            module = %c.module,
            file = %c.declaring_file,
            score = c.total_score,
            flagged = c.flagged,
            signals = %c.explain(),
            "scored candidate"
        );
        c
    }

    /// Scores every module and sorts best first: score descending, then
    /// declaring file, then name.
    pub fn score_all(
        &self,
        modules: &[Module],
        graph: &DependencyGraph,
        interfaces: &[Interface],
        repo_hint: Option<&str>,
    ) -> Vec<ScoredCandidate> {
        let keys: BTreeSet<String> = interfaces.iter().map(|i| self.interface_key(&i.name)).collect();
        let mut candidates: Vec<ScoredCandidate> = modules
            .iter()
            .map(|m| self.score(m, graph, &keys, repo_hint))
            .collect();
        candidates.sort_by(rank);
        candidates
    }

    /// Picks the top module.
    ///
    /// Unflagged candidates above the floor are preferred; flagged ones are
    /// considered only when no unflagged candidate clears it. A tie for the
    /// best score is broken by file then name with a `W201` warning, or
    /// leaves no top under `strict_ties`.
    pub fn resolve(
        &self,
        modules: &[Module],
        graph: &DependencyGraph,
        interfaces: &[Interface],
        repo_hint: Option<&str>,
        sink: &DiagnosticSink,
    ) -> Resolution {
        let candidates = self.score_all(modules, graph, interfaces, repo_hint);
        let floor = self.config.weights.floor;

        let above = |flagged: bool| -> Vec<&ScoredCandidate> {
            candidates
                .iter()
                .filter(|c| c.flagged == flagged && c.total_score > floor)
                .collect()
        };
        let mut tier = above(false);
        if tier.is_empty() {
            tier = above(true);
        }

        let Some(&best) = tier.first() else {
            tracing::info!(candidates = candidates.len(), "no candidate cleared the score floor");
            return Resolution {
                candidates,
                ..Resolution::default()
            };
        };

        let tied: Vec<ScoredCandidate> = tier
            .iter()
            .take_while(|c| (c.total_score - best.total_score).abs() < SCORE_EPSILON)
            .map(|&c| c.clone())
            .collect();
        let tied = if tied.len() > 1 { tied } else { Vec::new() };

        if !tied.is_empty() {
            let names: Vec<String> = tied
                .iter()
                .map(|c| format!("{} ({})", c.module, c.declaring_file))
                .collect();
            if self.config.strict_ties {
                tracing::warn!(tied = %names.join(", "), "top module is ambiguous");
                return Resolution {
                    top: None,
                    candidates,
                    tied,
                    overridden: false,
                };
            }
            tracing::warn!(chosen = %best.module, tied = %names.join(", "), "breaking tie");
            sink.emit(
                Diagnostic::warning(
                    codes::TIE_BROKEN,
                    format!(
                        "{} candidates share the best score {}; chose '{}'",
                        tied.len(),
                        best.total_score,
                        best.module
                    ),
                    Span::DUMMY,
                )
                .with_path(best.declaring_file.clone())
                .with_note(format!("tied: {}", names.join(", ")))
                .with_help("pass an explicit top module or set `[resolver] strict_ties = true`"),
            );
        }

        let top = ResolvedTop::from(best);
        tracing::info!(top = %top.module, file = %top.declaring_file, score = top.score, "resolved top module");
        Resolution {
            top: Some(top),
            candidates,
            tied,
            overridden: false,
        }
    }

    /// Uses `name` as the top without scoring it against the others.
    ///
    /// Candidates are still scored for reporting. When `name` is not a
    /// scanned module the resolution has no top. Among duplicate
    /// declarations the best-ranked one wins.
    pub fn resolve_override(
        &self,
        name: &str,
        modules: &[Module],
        graph: &DependencyGraph,
        interfaces: &[Interface],
        repo_hint: Option<&str>,
        sink: &DiagnosticSink,
    ) -> Resolution {
        let candidates = self.score_all(modules, graph, interfaces, repo_hint);
        let case_insensitive = self.config.dialect.case_insensitive();
        let chosen = candidates.iter().find(|c| {
            if case_insensitive {
                c.module.eq_ignore_ascii_case(name)
            } else {
                c.module == name
            }
        });

        let top = chosen.map(ResolvedTop::from);
        if let Some(top) = &top {
            sink.emit(
                Diagnostic::note(
                    codes::TOP_OVERRIDE,
                    format!("using '{}' as the top module as requested", top.module),
                    Span::DUMMY,
                )
                .with_path(top.declaring_file.clone())
                .with_note("name-based scoring was skipped"),
            );
            tracing::info!(top = %top.module, "top module overridden");
        }
        Resolution {
            top,
            candidates,
            tied: Vec::new(),
            overridden: true,
        }
    }
}

fn rank(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.total_score
        .total_cmp(&a.total_score)
        .then_with(|| a.declaring_file.as_bytes().cmp(b.declaring_file.as_bytes()))
        .then_with(|| a.module.cmp(&b.module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdlmap_common::Dialect;
    use hdlmap_scan::Instantiation;

    struct Fixture {
        modules: Vec<Module>,
        insts: Vec<Instantiation>,
        interfaces: Vec<Interface>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                modules: Vec::new(),
                insts: Vec::new(),
                interfaces: Vec::new(),
            }
        }

        fn module(mut self, name: &str, file: &str, attrs: &[ModuleAttribute], dialect: Dialect) -> Self {
            let mut m = Module::new(name, file, dialect, Span::DUMMY);
            m.attributes.extend(attrs.iter().copied());
            self.modules.push(m);
            self
        }

        fn v(self, name: &str, file: &str) -> Self {
            self.module(name, file, &[], Dialect::Verilog)
        }

        fn edge(mut self, parent: &str, child: &str) -> Self {
            self.insts.push(Instantiation {
                parent: parent.to_string(),
                parent_file: String::new(),
                child: child.to_string(),
                resolved: true,
                span: Span::DUMMY,
            });
            self
        }

        fn resolve(&self, config: ResolverConfig, hint: Option<&str>) -> (Resolution, DiagnosticSink) {
            let graph = DependencyGraph::build(&self.modules, &self.insts);
            let sink = DiagnosticSink::new();
            let r = TopResolver::new(config)
                .unwrap()
                .resolve(&self.modules, &graph, &self.interfaces, hint, &sink);
            (r, sink)
        }
    }

    fn verilog() -> ResolverConfig {
        ResolverConfig::defaults_for(Dialect::Verilog)
    }

    #[test]
    fn repo_name_wins() {
        let f = Fixture::new()
            .v("picorv32", "picorv32.v")
            .v("picorv32_axi", "picorv32.v")
            .v("picorv32_pcpi_mul", "picorv32.v")
            .edge("picorv32_axi", "picorv32")
            .edge("picorv32", "picorv32_pcpi_mul");
        let (r, _) = f.resolve(verilog(), Some("picorv32"));
        assert_eq!(r.top.unwrap().module, "picorv32");
    }

    #[test]
    fn conventions_and_structure_without_hint() {
        let f = Fixture::new()
            .v("cpu_top", "rtl/cpu_top.v")
            .v("alu", "rtl/alu.v")
            .v("regfile", "rtl/regfile.v")
            .v("uart_tx", "rtl/uart_tx.v")
            .edge("cpu_top", "alu")
            .edge("cpu_top", "regfile");
        let (r, sink) = f.resolve(verilog(), None);
        let top = r.top.unwrap();
        assert_eq!(top.module, "cpu_top");
        assert!(sink.diagnostics().is_empty());
        let uart = r.candidates.iter().find(|c| c.module == "uart_tx").unwrap();
        assert!(uart.flagged);
    }

    #[test]
    fn testbench_loses_to_its_dut() {
        let f = Fixture::new()
            .module("tb", "sim/tb.v", &[ModuleAttribute::SimulationOnly, ModuleAttribute::NoPorts], Dialect::Verilog)
            .v("core", "rtl/core.v")
            .edge("tb", "core");
        let (r, _) = f.resolve(verilog(), None);
        assert_eq!(r.top.unwrap().module, "core");
    }

    #[test]
    fn flagged_only_project_still_resolves() {
        let f = Fixture::new().v("uart", "uart.v");
        let (r, _) = f.resolve(verilog(), None);
        // rule:peripheral -400 + zero fan-in 200 stays below the floor.
        assert!(r.top.is_none());
        assert_eq!(r.candidates.len(), 1);

        // core(+250) + peripheral(-400) + zero fan-in(+200) clears the floor
        // while flagged; `x` is unflagged but scores 0.
        let f = Fixture::new().v("uart_core", "a.v").v("x", "b.v").edge("uart_core", "x");
        let (r, _) = f.resolve(verilog(), None);
        let top = r.top.unwrap();
        assert_eq!(top.module, "uart_core");
        assert!(r.candidates[0].flagged);
    }

    #[test]
    fn ties_break_by_path_then_name() {
        let f = Fixture::new().v("beta", "b/x.v").v("alpha", "b/x.v").v("gamma", "a/y.v");
        let (r, sink) = f.resolve(verilog(), None);
        assert_eq!(r.top.unwrap().module, "gamma");
        assert_eq!(r.tied.len(), 3);
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code.to_string(), "W201");
        let order: Vec<_> = r.candidates.iter().map(|c| c.module.as_str()).collect();
        assert_eq!(order, vec!["gamma", "alpha", "beta"]);
    }

    #[test]
    fn strict_ties_yield_no_top() {
        let f = Fixture::new().v("one", "a.v").v("two", "b.v");
        let mut config = verilog();
        config.strict_ties = true;
        let (r, sink) = f.resolve(config, None);
        assert!(r.top.is_none());
        assert!(r.is_ambiguous());
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn bluespec_synthesize_and_prefix() {
        let mut f = Fixture::new()
            .module("mkCore", "src/Core.bsv", &[ModuleAttribute::Synthesize], Dialect::Bluespec)
            .module("mkTb", "src/Tb.bsv", &[ModuleAttribute::EmptyInterface, ModuleAttribute::NoPorts], Dialect::Bluespec)
            .module("mkFIFO2", "src/Fifo.bsv", &[], Dialect::Bluespec)
            .edge("mkTb", "mkCore")
            .edge("mkCore", "mkFIFO2");
        f.interfaces.push(Interface {
            name: "Core_IFC".to_string(),
            file: "src/Core.bsv".to_string(),
        });
        let (r, _) = f.resolve(ResolverConfig::defaults_for(Dialect::Bluespec), Some("Core"));
        let top = r.top.unwrap();
        assert_eq!(top.module, "mkCore");
        let core = &r.candidates[0];
        let names: Vec<_> = core.contributing_signals.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"repo-exact"));
        assert!(names.contains(&"rule:mk-convention"));
        assert!(names.contains(&"interface-affinity"));
        assert!(names.contains(&"synthesize"));
    }

    #[test]
    fn empty_project_has_no_top() {
        let (r, _) = Fixture::new().resolve(verilog(), None);
        assert!(r.top.is_none());
        assert!(r.candidates.is_empty());
        assert!(!r.is_ambiguous());
    }

    #[test]
    fn fan_out_is_capped_and_unresolved_ignored() {
        let mut f = Fixture::new().v("hub", "hub.v");
        for i in 0..20 {
            let name = format!("leaf{i}");
            f = f.v(&name, "leaves.v").edge("hub", &name);
        }
        f.insts.push(Instantiation {
            parent: "hub".to_string(),
            parent_file: "hub.v".to_string(),
            child: "external_ip".to_string(),
            resolved: false,
            span: Span::DUMMY,
        });
        let (r, _) = f.resolve(verilog(), None);
        let hub = r.candidates.iter().find(|c| c.module == "hub").unwrap();
        let fan_out = hub.contributing_signals.iter().find(|s| s.name == "fan-out").unwrap();
        assert_eq!(fan_out.value, 40.0 * 12.0);
    }

    #[test]
    fn override_selects_named_module() {
        let f = Fixture::new().v("core", "core.v").v("soc_top", "top.v").edge("soc_top", "core");
        let graph = DependencyGraph::build(&f.modules, &f.insts);
        let sink = DiagnosticSink::new();
        let resolver = TopResolver::new(verilog()).unwrap();

        let r = resolver.resolve_override("core", &f.modules, &graph, &[], None, &sink);
        assert!(r.overridden);
        assert_eq!(r.top.unwrap().module, "core");
        assert_eq!(sink.diagnostics()[0].code.to_string(), "H001");

        let r = resolver.resolve_override("missing", &f.modules, &graph, &[], None, &sink);
        assert!(r.top.is_none());
        assert_eq!(r.candidates.len(), 2);
    }

    #[test]
    fn invalid_rule_is_an_error() {
        let mut config = verilog();
        config.rules.push(hdlmap_config::NameRule {
            name: "broken".to_string(),
            pattern: "(".to_string(),
            weight: 1.0,
            kind: RuleKind::Convention,
            dialects: Vec::new(),
        });
        assert!(matches!(TopResolver::new(config), Err(ResolveError::InvalidRule { .. })));
    }
}
