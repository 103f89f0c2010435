//! Incremental decoder for server-sent event bodies
//!
//! Network chunks do not respect line boundaries, so bytes are buffered
//! until a full line is available. Decoding happens per line, which keeps
//! multi-byte characters split across chunks intact.

/// Buffers raw body bytes and yields the payload of each complete `data:` line
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk, returning payloads of every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(payload) = data_payload(&String::from_utf8_lossy(&line)) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line that arrived without a newline
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&String::from_utf8_lossy(&rest))
    }
}

fn data_payload(line: &str) -> Option<String> {
    let line = line.trim_end_matches(['\n', '\r']);
    // Blank lines separate events, `:` starts a comment
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let data = line.strip_prefix("data:")?;
    Some(data.strip_prefix(' ').unwrap_or(data).to_string())
}
