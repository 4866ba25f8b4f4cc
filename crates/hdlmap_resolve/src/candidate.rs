//! Scored candidates and the resolved top.

use serde::Serialize;

/// One signal's contribution to a candidate's score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Signal {
    /// Signal name, e.g. `repo-exact` or `rule:core`.
    pub name: String,
    /// Points added (negative for penalties).
    pub value: f64,
}

/// A module with its total score and the signals behind it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredCandidate {
    /// Module name.
    pub module: String,
    /// Declaring file, relative to the project root.
    pub declaring_file: String,
    /// Sum of all signal values.
    pub total_score: f64,
    /// Signals that fired, in evaluation order.
    pub contributing_signals: Vec<Signal>,
    /// A negative naming indicator fired.
    pub flagged: bool,
}

impl ScoredCandidate {
    pub(crate) fn new(module: &str, declaring_file: &str) -> Self {
        Self {
            module: module.to_string(),
            declaring_file: declaring_file.to_string(),
            total_score: 0.0,
            contributing_signals: Vec::new(),
            flagged: false,
        }
    }

    pub(crate) fn add(&mut self, name: impl Into<String>, value: f64) {
        if value == 0.0 {
            return;
        }
        self.total_score += value;
        self.contributing_signals.push(Signal {
            name: name.into(),
            value,
        });
    }

    /// Renders the signals as `name(+value)` pairs for explanations.
    pub fn explain(&self) -> String {
        self.contributing_signals
            .iter()
            .map(|s| format!("{}({:+})", s.name, s.value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The module chosen as top.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedTop {
    /// Module name.
    pub module: String,
    /// Declaring file, relative to the project root.
    pub declaring_file: String,
    /// Winning score (0 for an explicit override of an unscored module).
    pub score: f64,
}

impl From<&ScoredCandidate> for ResolvedTop {
    fn from(c: &ScoredCandidate) -> Self {
        Self {
            module: c.module.clone(),
            declaring_file: c.declaring_file.clone(),
            score: c.total_score,
        }
    }
}
