//! Turning raw child output into display units.
//!
//! Bytes read from a child are first decoded with [`Utf8Decoder`], which keeps
//! an incomplete multi-byte sequence until the next read completes it. The
//! decoded text is then cut into [`Frame`]s by a [`LineFramer`] according to
//! the run's [`FramingPolicy`].

use std::mem;

use serde::Deserialize;
use strip_ansi_escapes::strip;

/// How decoded text is cut into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FramingPolicy {
    /// Buffer across reads and emit one unit per terminated line.
    #[default]
    Line,
    /// Emit each read as one unit holding all of its non-empty lines.
    Chunk,
}

/// One display unit: a non-empty list of lines without terminators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<String>,
}

impl Frame {
    pub fn single(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Streaming UTF-8 decoder. Invalid bytes decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `bytes` (plus any held tail) as is complete.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Incomplete sequence at the end; wait for more bytes.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let tail = rest.to_vec();
        self.pending = tail;
        out
    }

    /// Flushes whatever is still held at end of stream.
    pub fn finish(&mut self) -> String {
        let rest = mem::take(&mut self.pending);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

/// Incremental framer for one source stream.
#[derive(Debug, Clone)]
pub struct LineFramer {
    policy: FramingPolicy,
    strip_ansi: bool,
    buffer: String,
}

impl LineFramer {
    pub fn new(policy: FramingPolicy) -> Self {
        Self {
            policy,
            strip_ansi: false,
            buffer: String::new(),
        }
    }

    /// Removes ANSI escapes from each line before it is framed, so a line
    /// made only of escapes counts as empty.
    pub fn with_strip_ansi(mut self, strip_ansi: bool) -> Self {
        self.strip_ansi = strip_ansi;
        self
    }

    /// Feeds one decoded chunk, returning the units it completes.
    pub fn push(&mut self, text: &str) -> Vec<Frame> {
        match self.policy {
            FramingPolicy::Line => self.push_lines(text),
            FramingPolicy::Chunk => self.split_chunk(text).into_iter().collect(),
        }
    }

    /// Flushes an unterminated trailing line at end of stream.
    pub fn finish(&mut self) -> Option<Frame> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = mem::take(&mut self.buffer);
        Some(Frame::single(self.clean(&line)))
    }

    // Only `text` is scanned for terminators; the held partial line is never
    // searched again.
    fn push_lines(&mut self, text: &str) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut rest = text;
        while let Some(pos) = rest.find('\n') {
            self.buffer.push_str(&rest[..pos]);
            let line = mem::take(&mut self.buffer);
            frames.push(Frame::single(self.clean(&line)));
            rest = &rest[pos + 1..];
        }
        self.buffer.push_str(rest);
        frames
    }

    fn split_chunk(&self, text: &str) -> Option<Frame> {
        let lines: Vec<String> = text
            .split('\n')
            .map(|fragment| self.clean(fragment))
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(Frame { lines })
        }
    }

    fn clean(&self, line: &str) -> String {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if self.strip_ansi {
            sanitize_text(line)
        } else {
            line.to_string()
        }
    }
}

/// Removes ANSI escape sequences emitted by the command itself.
pub fn sanitize_text(text: &str) -> String {
    let stripped = strip(text.as_bytes());
    String::from_utf8_lossy(&stripped).into_owned()
}
