//! Newline framing for the analysis event stream.

use bytes::BytesMut;

/// Prefix of payload-bearing lines in the stream.
const DATA_PREFIX: &str = "data: ";

/// Splits an append-only stream of raw chunks into record payloads.
///
/// Chunks carry no alignment guarantee: one record may span several chunks
/// and one chunk may complete several records. An incomplete trailing line
/// stays buffered until a later chunk supplies its newline. Lines without
/// the `data: ` prefix (blank keep-alive lines included) are dropped. No
/// parsing happens here.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: BytesMut,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the payload of every line it completes,
    /// in arrival order. Invalid UTF-8 is replaced lossily, per line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            let line = &line[..pos];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let text = String::from_utf8_lossy(line);
            if let Some(payload) = text.strip_prefix(DATA_PREFIX) {
                payloads.push(payload.to_string());
            }
        }
        payloads
    }

    /// Bytes of an incomplete trailing line, if any. Discarded at end of
    /// stream: without its newline a fragment cannot be a complete record.
    pub fn leftover(&self) -> &[u8] {
        &self.buffer
    }
}
