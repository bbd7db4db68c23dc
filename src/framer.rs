//! Line framing for the raw telemetry byte stream.

/// Reassembles newline-terminated text lines from raw byte chunks.
///
/// The collection process writes whenever it pleases, so a read may return
/// zero, one, or many newlines and may end mid-line. The framer accumulates
/// bytes and extracts every complete line per push, leaving any trailing
/// partial line buffered for the next push.
///
/// Invariant: bytes are never dropped and never duplicated. Concatenating all
/// chunks ever pushed equals the concatenation of all extracted raw lines
/// (with their terminators) plus [`remainder`](Self::remainder).
///
/// Extracted lines are trimmed of surrounding whitespace; lines that trim to
/// empty are dropped silently, since the underlying tool may emit blank
/// separators.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw bytes and extract every complete line.
    ///
    /// Returns the trimmed, non-empty lines completed by this chunk, in
    /// stream order. Non-UTF-8 bytes are replaced rather than rejected; the
    /// record layer will discard lines that fail to yield a device index.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(nl) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let raw = &self.buf[start..start + nl];
            let line = String::from_utf8_lossy(raw);
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
            start += nl + 1;
        }
        self.buf.drain(..start);

        lines
    }

    /// The buffered not-yet-terminated tail, if any.
    pub fn remainder(&self) -> &[u8] {
        &self.buf
    }
}
