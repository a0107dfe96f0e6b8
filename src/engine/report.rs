use crate::app::{FailureKind, MirrorError};

/// Progress made on a source that was fully processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSummary {
    /// Headlines delivered by the poller.
    pub seen: usize,
    /// Headlines whose stored bytes changed.
    pub written: usize,
}

/// Why a source was abandoned for the rest of a cycle.
#[derive(Debug)]
pub struct SourceFailure {
    pub kind: FailureKind,
    pub cause: MirrorError,
}

impl From<MirrorError> for SourceFailure {
    fn from(cause: MirrorError) -> Self {
        Self {
            kind: cause.kind(),
            cause,
        }
    }
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failure: {}", self.kind, self.cause)
    }
}

pub type SourceOutcome = std::result::Result<SourceSummary, SourceFailure>;

#[derive(Debug)]
pub struct SourceReport {
    pub source: String,
    pub outcome: SourceOutcome,
}

/// Per-source outcomes of one cycle, in configured order.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub sources: Vec<SourceReport>,
}

impl CycleReport {
    pub fn outcome(&self, source: &str) -> Option<&SourceOutcome> {
        self.sources
            .iter()
            .find(|r| r.source == source)
            .map(|r| &r.outcome)
    }

    pub fn written(&self) -> usize {
        self.sources
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .map(|s| s.written)
            .sum()
    }

    pub fn seen(&self) -> usize {
        self.sources
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .map(|s| s.seen)
            .sum()
    }

    pub fn failures(&self) -> usize {
        self.sources.iter().filter(|r| r.outcome.is_err()).count()
    }
}
