//! Outbound frame payload conventions
//!
//! Every frame on the research stream is one line of UTF-8 text. Three
//! payload kinds share the wire, distinguished by convention and recognized
//! in this priority order:
//!
//! 1. terminal sentinel — the literal `[DONE]`, exactly once, always last
//! 2. identifier — `RESEARCH_ID:<id>`, at most once per job
//! 3. content — everything else (stderr-origin lines carry the `ERR ` prefix)

/// Terminal sentinel payload; end-of-stream marker
pub const DONE_SENTINEL: &str = "[DONE]";

/// Prefix of the research identifier payload
pub const RESEARCH_ID_PREFIX: &str = "RESEARCH_ID:";

/// Prefix marking a content frame as stderr-origin (diagnostic text)
pub const STDERR_PREFIX: &str = "ERR ";

/// One decoded frame payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    /// End-of-stream sentinel
    Done,
    /// Research identifier (text after the `RESEARCH_ID:` prefix)
    ResearchId(String),
    /// Ordinary content line
    Content(String),
}

impl FramePayload {
    /// Classify a frame payload using the recognition priority order
    pub fn parse(payload: &str) -> Self {
        if payload == DONE_SENTINEL {
            return Self::Done;
        }
        if let Some(id) = payload.strip_prefix(RESEARCH_ID_PREFIX) {
            return Self::ResearchId(id.to_string());
        }
        Self::Content(payload.to_string())
    }
}

/// True when a content line originated from the backend's stderr
pub fn is_error_content(line: &str) -> bool {
    line.starts_with(STDERR_PREFIX)
}

/// Mark a stderr-origin line for the wire
pub fn mark_stderr(line: &str) -> String {
    format!("{}{}", STDERR_PREFIX, line)
}
