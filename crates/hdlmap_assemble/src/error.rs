//! Project-level analysis errors.

use std::path::PathBuf;

use hdlmap_common::InternalError;
use hdlmap_descriptor::DescriptorError;
use hdlmap_diagnostics::{codes, Diagnostic};
use hdlmap_resolve::{ResolveError, ScoredCandidate};
use hdlmap_source::Span;

/// Errors that end the analysis of one project.
///
/// None of these abort a batch: the caller records the project as failed
/// and moves on.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// No module declarations were found.
    #[error("no hardware modules found under {}", root.display())]
    EmptyProject {
        /// The analysed root.
        root: PathBuf,
    },

    /// No candidate cleared the score floor, or an override named an
    /// unknown module.
    #[error("no top module could be determined ({} candidates)", candidates.len())]
    NoTopFound {
        /// Every scored candidate, best first.
        candidates: Vec<ScoredCandidate>,
    },

    /// Several candidates tied for the best score under strict tie handling.
    #[error("top module is ambiguous between {}", tied_names(tied))]
    AmbiguousTop {
        /// The tied candidates.
        tied: Vec<ScoredCandidate>,
        /// Every scored candidate, best first.
        candidates: Vec<ScoredCandidate>,
    },

    /// A build descriptor or entry point could not be placed.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The source tree could not be walked.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The directory being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The resolver tables are invalid.
    #[error(transparent)]
    Resolver(#[from] ResolveError),

    /// A bug in hdlmap.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

fn tied_names(tied: &[ScoredCandidate]) -> String {
    tied.iter()
        .map(|c| format!("'{}' ({})", c.module, c.declaring_file))
        .collect::<Vec<_>>()
        .join(", ")
}

impl AnalysisError {
    /// The scored candidates attached to the error, if any.
    pub fn candidates(&self) -> &[ScoredCandidate] {
        match self {
            AnalysisError::NoTopFound { candidates } | AnalysisError::AmbiguousTop { candidates, .. } => {
                candidates
            }
            _ => &[],
        }
    }

    /// Converts this error into a diagnostic, when it has a catalogue code.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        let diag = match self {
            AnalysisError::EmptyProject { .. } => {
                Diagnostic::error(codes::EMPTY_PROJECT, self.to_string(), Span::DUMMY)
                    .with_help("check the path and the dialect override")
            }
            AnalysisError::NoTopFound { candidates } => {
                let mut d = Diagnostic::error(codes::NO_TOP_FOUND, self.to_string(), Span::DUMMY)
                    .with_help("pass the top module explicitly with --top");
                if let Some(best) = candidates.first() {
                    d = d.with_note(format!(
                        "best candidate '{}' scored {}: {}",
                        best.module,
                        best.total_score,
                        best.explain()
                    ));
                }
                d
            }
            AnalysisError::AmbiguousTop { .. } => {
                Diagnostic::error(codes::AMBIGUOUS_TOP, self.to_string(), Span::DUMMY)
                    .with_help("pass the top module explicitly with --top")
            }
            AnalysisError::Descriptor(e) => e.to_diagnostic(),
            _ => return None,
        };
        Some(diag)
    }
}
