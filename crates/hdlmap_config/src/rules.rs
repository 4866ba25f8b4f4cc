//! Name rules: regular expressions over snake-cased module names.

use hdlmap_common::Dialect;
use serde::Deserialize;

/// How a matching name rule affects a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// A naming convention that suggests a top-level unit.
    #[default]
    Convention,
    /// A negative indicator. A match also flags the candidate, demoting it
    /// below every unflagged candidate that clears the floor.
    Negative,
}

/// One `[[resolver.rules]]` entry.
///
/// ```toml
/// [[resolver.rules]]
/// name = "debug"
/// pattern = "(^|_)debug($|_)"
/// weight = -300.0
/// kind = "negative"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NameRule {
    /// Rule name shown in explanations.
    pub name: String,
    /// Regular expression matched against the snake-cased module name.
    pub pattern: String,
    /// Score added when the pattern matches.
    pub weight: f64,
    /// Convention or negative indicator.
    #[serde(default)]
    pub kind: RuleKind,
    /// Restricts the rule to these dialects; empty means all.
    #[serde(default)]
    pub dialects: Vec<Dialect>,
}

impl NameRule {
    fn new(name: &str, pattern: &str, weight: f64, kind: RuleKind) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            weight,
            kind,
            dialects: Vec::new(),
        }
    }

    /// Returns `true` if this rule applies to `dialect`.
    pub fn applies_to(&self, dialect: Dialect) -> bool {
        self.dialects.is_empty() || self.dialects.contains(&dialect)
    }
}

/// Returns the built-in name rules that apply to `dialect`.
pub fn default_rules(dialect: Dialect) -> Vec<NameRule> {
    use RuleKind::{Convention, Negative};

    let mut rules = vec![
        NameRule::new("top", r"(^|_)top\d*($|_)", 300.0, Convention),
        NameRule::new(
            "core",
            r"(^|_)(core|cpu|processor|proc|soc)\d*($|_)",
            250.0,
            Convention,
        ),
        NameRule::new("top-affix", r"(_top$|^top_)", 100.0, Convention),
        NameRule::new(
            "peripheral",
            r"(^|_)(uart|spi|i2c|gpio|timer|pwm|jtag|vga|hdmi|ethernet|usb|plic|clint|dma|sdram|ps2)\d*($|_)",
            -400.0,
            Negative,
        ),
        NameRule::new(
            "testbench",
            r"(^|_)(tb|test|testbench|bench|sim)\d*($|_)",
            -600.0,
            Negative,
        ),
        NameRule::new(
            "utility",
            r"(^|_)(fifo|mux|demux|buffer|sync|synchronizer|wrapper|adapter|bridge|counter|ram|rom|memory|mem)\d*($|_)",
            -300.0,
            Negative,
        ),
        NameRule::new(
            "functional-unit",
            r"(^|_)(alu|regfile|reg_file|register_file|multiplier|divider|mul|div|fpu|shifter|decoder|decode|csr|branch|lsu)\d*($|_)",
            -350.0,
            Negative,
        ),
    ];

    let mut bluespec = NameRule::new(
        "mk-convention",
        r"^mk_(top|core|proc|cpu|soc)",
        100.0,
        Convention,
    );
    bluespec.dialects = vec![Dialect::Bluespec];
    rules.push(bluespec);

    rules.retain(|r| r.applies_to(dialect));
    rules
}

/// Returns the conventional top-unit prefixes stripped before name comparison.
pub fn convention_prefixes(dialect: Dialect) -> Vec<String> {
    match dialect {
        Dialect::Bluespec => vec!["mk".to_string()],
        _ => Vec::new(),
    }
}
