/*
[INPUT]:  Raw body chunks from a streaming HTTP response
[OUTPUT]: Parsed JSON messages or malformed-line reports, one per line
[POS]:    Stream layer - incremental newline-delimited JSON decoding
[UPDATE]: When the stream framing changes
*/

use serde_json::Value;

/// Default cap for a single buffered line (1 MiB)
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Result of decoding one line
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    Message(Value),
    Malformed { error: String, raw: String },
}

/// Splits chunks into lines and parses each one as JSON.
///
/// Chunk boundaries are arbitrary: a message may arrive split across several
/// chunks, or several messages may share one.
#[derive(Debug)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    max_line_bytes: usize,
    malformed_count: u64,
    /// Dropping the rest of an oversized line up to its terminator
    discarding: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }

    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line_bytes: max_line_bytes.max(1),
            malformed_count: 0,
            discarding: false,
        }
    }

    /// Lines that failed to parse since creation
    pub fn malformed_count(&self) -> u64 {
        self.malformed_count
    }

    /// Bytes held while waiting for a line terminator
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one chunk and return every line it completed
    pub fn push(&mut self, bytes: &[u8]) -> Vec<DecodedLine> {
        let mut lines = Vec::new();
        let mut bytes = bytes;
        if self.discarding {
            match bytes.iter().position(|&b| b == b'\n') {
                Some(offset) => {
                    self.discarding = false;
                    bytes = &bytes[offset + 1..];
                }
                None => return lines,
            }
        }
        if bytes.is_empty() {
            return lines;
        }

        self.buffer.extend_from_slice(bytes);

        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            if let Some(line) = self.decode_line(start, end) {
                lines.push(line);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        if self.buffer.len() > self.max_line_bytes {
            let held = self.buffer.len();
            self.buffer.clear();
            self.discarding = true;
            self.malformed_count += 1;
            lines.push(DecodedLine::Malformed {
                error: format!("line exceeds {} bytes (held {held})", self.max_line_bytes),
                raw: String::new(),
            });
        }

        lines
    }

    /// Decode whatever is left once the body ends
    pub fn finish(&mut self) -> Vec<DecodedLine> {
        if self.discarding {
            self.discarding = false;
            self.buffer.clear();
            return Vec::new();
        }
        let end = self.buffer.len();
        let line = self.decode_line(0, end);
        self.buffer.clear();
        line.into_iter().collect()
    }

    fn decode_line(&mut self, start: usize, end: usize) -> Option<DecodedLine> {
        let line = self.buffer[start..end].trim_ascii();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_slice::<Value>(line) {
            Ok(value) => Some(DecodedLine::Message(value)),
            Err(err) => {
                self.malformed_count += 1;
                Some(DecodedLine::Malformed {
                    error: err.to_string(),
                    raw: String::from_utf8_lossy(line).into_owned(),
                })
            }
        }
    }
}
