//! Core segmentation engine module

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::planner::StrategyKind;

pub mod segmenter;

pub use segmenter::SegmentationEngine;

/// Outcome of one strategy attempt on one segment. Transient: used only to
/// decide fallback and to build failure reports.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub strategy: StrategyKind,
    pub error: String,
}

/// How a completed segment came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompletionKind {
    /// Destination already existed before any work (resume path)
    AlreadyPresent,
    /// Produced by a stream-copy attempt
    StreamCopied,
    /// Produced by a re-encode attempt
    Reencoded,
}

/// Terminal failure of one segment, carrying every strategy that was tried
#[derive(Debug, Clone, Serialize)]
pub struct SegmentFailure {
    pub index: usize,
    pub name: String,
    pub attempts: Vec<AttemptRecord>,
    pub last_error: String,
}

impl fmt::Display for SegmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            write!(
                f,
                "segment {} ({}): {}",
                self.index, self.name, self.last_error
            )
        } else {
            let tried: Vec<String> = self
                .attempts
                .iter()
                .map(|a| a.strategy.to_string())
                .collect();
            write!(
                f,
                "segment {} ({}): tried [{}], last error: {}",
                self.index,
                self.name,
                tried.join(", "),
                self.last_error
            )
        }
    }
}

/// Per-index result of one segment
#[derive(Debug, Clone)]
pub enum SegmentOutcome {
    Completed {
        index: usize,
        name: String,
        path: PathBuf,
        via: CompletionKind,
    },
    Failed(SegmentFailure),
}

impl SegmentOutcome {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            SegmentOutcome::Completed { path, .. } => Some(path),
            SegmentOutcome::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SegmentOutcome::Failed(_))
    }
}

/// Aggregate result of one `segment_all` call: one outcome per input
/// segment, in input order.
#[derive(Debug)]
pub struct SegmentationRun {
    pub outcomes: Vec<SegmentOutcome>,
}

impl SegmentationRun {
    /// Output paths for the completed segments, input order preserved
    pub fn completed_paths(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.path().cloned())
            .collect()
    }

    pub fn failures(&self) -> Vec<SegmentFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                SegmentOutcome::Failed(failure) => Some(failure.clone()),
                SegmentOutcome::Completed { .. } => None,
            })
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.outcomes.iter().any(SegmentOutcome::is_failed)
    }
}
