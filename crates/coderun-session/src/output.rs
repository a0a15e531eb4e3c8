//! Append-only program output.

/// Ordered log of the output chunks a program produced.
///
/// Chunks are only ever appended; nothing is edited or reordered once
/// recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputLog {
    chunks: Vec<String>,
}

impl OutputLog {
    /// Create an empty output log.
    pub fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    /// Append a chunk to the end of the log.
    pub fn append(&mut self, chunk: impl Into<String>) {
        self.chunks.push(chunk.into());
    }

    /// All chunks in the order they were produced.
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Chunks appended after the first `count`.
    ///
    /// Lets a caller that has already seen `count` chunks fetch only the new
    /// ones. A `count` past the end yields nothing.
    pub fn since(&self, count: usize) -> &[String] {
        &self.chunks[count.min(self.chunks.len())..]
    }

    /// The most recent chunk, if any.
    pub fn last(&self) -> Option<&str> {
        self.chunks.last().map(String::as_str)
    }

    /// Full transcript, one chunk per line.
    pub fn transcript(&self) -> String {
        self.chunks.join("\n")
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no output has been produced.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total size of all chunks in bytes.
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(String::len).sum()
    }
}
