//! Per-job progress state machine
//!
//! One tracker instance exists per active job and is the only mutator of
//! that job's progress state. Percent is non-decreasing for the lifetime
//! of the job; starting a new job means creating a new tracker.

use super::{Phase, ProgressUpdate, RuleTable};

/// Step label forced on the terminal sentinel
const COMPLETED_LABEL: &str = "Research completed!";

/// Step label forced on a transport-level error
const ERROR_LABEL: &str = "Error occurred";

/// Step label set when the research identifier arrives
const PLAN_CREATED_LABEL: &str = "Research plan created...";

/// Stateful accumulator for one research job
#[derive(Debug)]
pub struct ProgressTracker {
    phase: Phase,
    step: String,
    percent: f32,
    log: Vec<String>,
    table: RuleTable,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// New tracker in the initial `{Idle, "", 0}` state
    pub fn new() -> Self {
        Self::with_table(RuleTable::default())
    }

    /// New tracker with a custom classification table
    pub fn with_table(table: RuleTable) -> Self {
        Self {
            phase: Phase::Idle,
            step: String::new(),
            percent: 0.0,
            log: Vec::new(),
            table,
        }
    }

    /// Consume one content line: append to the log, classify, and apply
    ///
    /// A later rule must never visually regress progress, so the candidate
    /// percent is clamped to `max(current, candidate)`; phase and step
    /// label are replaced unconditionally with the candidate's.
    pub fn on_content_line(&mut self, line: &str) {
        self.log.push(line.to_string());
        if self.phase.is_terminal() {
            return;
        }
        if let Some(ProgressUpdate {
            phase,
            percent,
            step,
        }) = self.table.classify(line)
        {
            self.percent = self.percent.max(percent);
            self.phase = phase;
            self.step = step;
        }
    }

    /// The research identifier arrived; the backend has a plan under way
    pub fn on_research_id(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.phase = Phase::Planning;
        self.step = PLAN_CREATED_LABEL.to_string();
        self.percent = self.percent.max(10.0);
    }

    /// Terminal sentinel seen; the job completed cleanly
    pub fn on_done(&mut self) {
        self.phase = Phase::Done;
        self.step = COMPLETED_LABEL.to_string();
        self.percent = 100.0;
    }

    /// Transport-level error; terminal, percent unchanged
    pub fn on_transport_error(&mut self) {
        if self.phase == Phase::Done {
            return;
        }
        self.phase = Phase::Error;
        self.step = ERROR_LABEL.to_string();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn step(&self) -> &str {
        &self.step
    }

    /// Ordered log of every content line seen so far
    pub fn log(&self) -> &[String] {
        &self.log
    }
}
