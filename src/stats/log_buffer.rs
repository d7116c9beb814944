//! # Bounded append-only log text.
//!
//! Lines are stored terminated by `\n`. When the text grows past `max_len`,
//! everything up to and including the first `\n` at or after `prune_offset`
//! is dropped; this repeats until the text fits again, so the buffer always
//! starts at a line start and ends with a complete line.

/// Bounded text buffer of completed lines.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    text: String,
    max_len: usize,
    prune_offset: usize,
}

impl LogBuffer {
    /// Creates an empty buffer.
    ///
    /// `prune_offset` is clamped below `max_len` so every prune makes progress.
    pub fn new(max_len: usize, prune_offset: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            text: String::new(),
            max_len,
            prune_offset: prune_offset.min(max_len - 1),
        }
    }

    /// Appends one line (a trailing line separator is added).
    pub fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
        self.prune();
    }

    fn prune(&mut self) {
        while self.text.len() > self.max_len {
            let from = self.prune_offset.min(self.text.len() - 1);
            match self.text.as_bytes()[from..].iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.text.drain(..=from + pos);
                }
                // Unreachable while every line ends with '\n'.
                None => self.text.clear(),
            }
        }
    }

    /// Current log text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}
