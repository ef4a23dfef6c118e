// Server-sent event line decoding.
//
// Bytes arrive in arbitrary chunks; complete lines are classified into
// payload lines, START/STOP control signals, and keep-alives. A partial
// trailing line stays buffered in the decoder, one decoder per connection.

use tracing::{debug, trace};

/// Longest partial line kept while waiting for a terminator.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Connection control signal observed on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Start,
    Stop,
}

/// One classified line of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// A `data:` line, passed on verbatim (prefix included).
    Data(String),
    Control(ControlSignal),
    /// Comment line or `KEEP-ALIVE` event.
    KeepAlive,
}

/// Incremental line decoder for a single stream connection.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    discarding: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(frame) = classify(line) {
                frames.push(frame);
            }
        }

        // Drop the oversized head of a line; skip the rest up to its newline.
        if self.buffer.len() > MAX_LINE_BYTES {
            debug!(bytes = self.buffer.len(), "dropping oversized stream line");
            self.buffer.clear();
            self.discarding = true;
        }
        frames
    }

    /// Bytes held back waiting for a line terminator.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn classify(line: &str) -> Option<StreamFrame> {
    if line.is_empty() {
        return None;
    }
    if line.starts_with(':') {
        return Some(StreamFrame::KeepAlive);
    }
    if line.starts_with("data:") {
        return Some(StreamFrame::Data(line.to_owned()));
    }
    if let Some(event) = line.strip_prefix("event:") {
        return match event.trim() {
            "KEEP-ALIVE" => Some(StreamFrame::KeepAlive),
            "CONNECTED" | "PAIRED" => Some(StreamFrame::Control(ControlSignal::Start)),
            "DISCONNECTED" | "DEPAIRED" => Some(StreamFrame::Control(ControlSignal::Stop)),
            _ => None,
        };
    }
    match line.trim() {
        "START" => Some(StreamFrame::Control(ControlSignal::Start)),
        "STOP" => Some(StreamFrame::Control(ControlSignal::Stop)),
        other => {
            trace!(line = other, "ignoring stream line");
            None
        }
    }
}
