//! Client-side research stream consumer
//!
//! One consumer instance per submitted question. Every received frame
//! payload is fed through [`StreamConsumer::feed`], which applies the
//! frame recognition priority order and drives the owned
//! [`ProgressTracker`]. Stream closure without a sentinel is abnormal
//! termination and must be reported via
//! [`StreamConsumer::on_stream_dropped`] — it is distinct from a clean
//! failure the backend described through content frames.

use crate::frame::FramePayload;
use crate::progress::{ProgressTracker, RuleTable};

/// How a stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Sentinel received; the stream completed cleanly
    Completed,
    /// The transport dropped before the sentinel arrived
    TransportDropped,
}

/// Owned per-job consumer state
#[derive(Debug, Default)]
pub struct StreamConsumer {
    tracker: ProgressTracker,
    research_id: Option<String>,
    termination: Option<Termination>,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer with a custom classification table
    pub fn with_table(table: RuleTable) -> Self {
        Self {
            tracker: ProgressTracker::with_table(table),
            research_id: None,
            termination: None,
        }
    }

    /// Feed one frame payload; returns `true` when the stream is finished
    /// and the reader should close
    pub fn feed(&mut self, payload: &str) -> bool {
        if self.termination.is_some() {
            return true;
        }
        match FramePayload::parse(payload) {
            FramePayload::Done => {
                self.tracker.on_done();
                self.termination = Some(Termination::Completed);
                true
            }
            FramePayload::ResearchId(id) => {
                // Only the first identifier is authoritative; later
                // matches are ordinary content.
                if self.research_id.is_none() {
                    tracing::debug!(research_id = %id, "research identifier received");
                    self.research_id = Some(id);
                    self.tracker.on_research_id();
                } else {
                    self.tracker.on_content_line(payload);
                }
                false
            }
            FramePayload::Content(line) => {
                self.tracker.on_content_line(&line);
                false
            }
        }
    }

    /// The transport closed without a sentinel
    pub fn on_stream_dropped(&mut self) {
        if self.termination.is_some() {
            return;
        }
        self.tracker.on_transport_error();
        self.termination = Some(Termination::TransportDropped);
    }

    /// Identifier from the first `RESEARCH_ID:` frame, if any
    pub fn research_id(&self) -> Option<&str> {
        self.research_id.as_deref()
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn is_finished(&self) -> bool {
        self.termination.is_some()
    }
}
