use piece_tree::{Chunk, EolStats, LineEnding, PieceTree, TreeConfig};

use crate::buffer::TextBuffer;

/// Collects streamed text before a [`TextBuffer`] is built.
///
/// Chunks are only stored here; the tree is built in one pass once all
/// text has arrived. A chunk ending in `\r` has that CR held back and
/// prepended to the next chunk, so a CRLF pair never straddles two chunks.
#[derive(Default, Debug)]
pub struct TextBufferBuilder {
    chunks: Vec<String>,
    held_cr: bool,
    accepted_len: usize,
    accepted_count: usize,
    config: Option<TreeConfig>,
}

impl TextBufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build with explicit piece sizing instead of deriving it from the
    /// average chunk length.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    /// Accept a chunk of text (may include multiple lines).
    pub fn accept_chunk(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        self.accepted_len += chunk.len();
        self.accepted_count += 1;

        let mut text = String::with_capacity(chunk.len() + 1);
        if std::mem::take(&mut self.held_cr) {
            text.push('\r');
        }
        text.push_str(chunk);
        if text.ends_with('\r') {
            text.pop();
            self.held_cr = true;
        }
        if !text.is_empty() {
            self.chunks.push(text);
        }
    }

    /// Stop accepting text, scan it for line breaks and detect the
    /// dominant line ending.
    pub fn finish(mut self) -> FinishedBuilder {
        if self.held_cr {
            match self.chunks.last_mut() {
                Some(last) => last.push('\r'),
                None => self.chunks.push("\r".to_string()),
            }
        }

        let chunks: Vec<Chunk> = self.chunks.into_iter().map(Chunk::from).collect();
        let mut stats = EolStats::default();
        for chunk in &chunks {
            stats.merge(&chunk.eol_stats());
        }

        let config = self.config.unwrap_or_else(|| {
            TreeConfig::from_average_chunk_len(self.accepted_len / self.accepted_count.max(1))
        });

        FinishedBuilder {
            chunks,
            stats,
            config,
        }
    }
}

/// All text has been accepted; only [`build`](Self::build) remains.
#[derive(Debug)]
pub struct FinishedBuilder {
    chunks: Vec<Chunk>,
    stats: EolStats,
    config: TreeConfig,
}

impl FinishedBuilder {
    /// The most frequent line ending in the accepted text.
    pub fn line_ending(&self) -> LineEnding {
        self.stats.dominant()
    }

    pub fn eol_stats(&self) -> EolStats {
        self.stats
    }

    pub fn config(&self) -> TreeConfig {
        self.config
    }

    pub fn build(self) -> TextBuffer {
        let line_ending = self.line_ending();
        let tree = PieceTree::from_chunks(self.chunks, self.config);
        TextBuffer::from_parts(tree, line_ending)
    }
}
