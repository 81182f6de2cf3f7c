//! Chunk-boundary-safe line framing
//!
//! Backend bodies arrive as arbitrary byte chunks; a logical line may be
//! split anywhere, including inside a multi-byte UTF-8 sequence or between
//! a `\r` and its `\n`. The framer buffers the partial tail of each chunk
//! and only ever yields complete logical lines, so a frame never splits a
//! line. The per-line buffer is the bounded memory the relay holds per
//! job.

/// Incremental splitter of a byte stream into logical lines
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one chunk; returns every line completed by it
    ///
    /// Line terminators are `\n` or `\r\n` and are not part of the
    /// returned text. Returned lines may be empty (callers decide whether
    /// empty lines are meaningful).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        for pos in 0..self.buf.len() {
            if self.buf[pos] != b'\n' {
                continue;
            }
            let mut end = pos;
            if end > start && self.buf[end - 1] == b'\r' {
                end -= 1;
            }
            lines.push(String::from_utf8_lossy(&self.buf[start..end]).into_owned());
            start = pos + 1;
        }
        self.buf.drain(..start);
        lines
    }

    /// Flush the remaining partial line at end of stream, if any
    ///
    /// A trailing `\r` is treated as a terminator remnant and dropped.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        if self.buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Some(line)
    }
}
