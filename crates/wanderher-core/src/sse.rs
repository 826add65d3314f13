//! Line-delimited `data:` event framing
//!
//! Used in three places: the provider's streaming response, the relay's own
//! output, and the client reading that output. Records look like
//! `data: <payload>\n\n`; the stream ends with `data: [DONE]\n\n`.

use serde_json::json;

use crate::ai::Fragment;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_MARKER: &str = "[DONE]";

/// One decoded `data:` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Frame an arbitrary payload as a single event.
pub fn frame_data(payload: &str) -> String {
    format!("{}{}\n\n", DATA_PREFIX, payload)
}

/// Frame a fragment as `data: {"content": "..."}`.
pub fn frame_fragment(fragment: &Fragment) -> String {
    frame_data(&json!({ "content": fragment.content }).to_string())
}

/// The termination sentinel event.
pub fn done_frame() -> String {
    frame_data(DONE_MARKER)
}

/// Incremental decoder for a byte stream of events.
///
/// Network chunks can split a line, or even a multi-byte character, anywhere;
/// bytes are held back until the terminating newline arrives. Lines without
/// the `data:` prefix (blank separators, comments, `event:` fields) are
/// ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that never got its newline.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(line: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
    // The space after the field name is optional
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data.trim() == DONE_MARKER {
        Some(SseEvent::Done)
    } else {
        Some(SseEvent::Data(data.to_string()))
    }
}
