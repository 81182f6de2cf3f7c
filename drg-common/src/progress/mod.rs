//! Progress inference for research job streams
//!
//! The research backend emits unstructured, human-readable progress lines;
//! there is no structured protocol. This module infers a coarse
//! `(phase, percent)` pair from those lines:
//!
//! - [`RuleTable`] is the pure classifier: an ordered table of pattern
//!   rules, first match wins, no state beyond the table.
//! - [`ProgressTracker`] is the per-job accumulator: feeds lines through
//!   the classifier, enforces percent monotonicity, and keeps the running
//!   log.

pub mod rules;
pub mod tracker;

pub use rules::{ProgressUpdate, RuleTable, SectionCurve};
pub use tracker::ProgressTracker;

use serde::Serialize;

/// Coarse pipeline stage of a research job
///
/// Transitions are monotonic left-to-right, except `Error`, which is
/// reachable from any phase and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Planning,
    Searching,
    Crawling,
    Indexing,
    Writing,
    Verifying,
    Done,
    Error,
}

impl Phase {
    /// True for the two terminal phases
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Error)
    }
}
