//! A piece tree: the text of a document as a balanced tree of slices
//! into immutable chunks.
//!
//! Offsets, lengths and columns are byte based. Lines are 1-based and
//! include their terminator (`\n`, `\r\n` or a bare `\r`).

mod chunk;
mod config;
mod edit;
mod eol;
mod invariants;
mod piece;
mod tree;

use std::fmt;
use std::ops::Range;

use thiserror::Error;
use tracing::debug;

pub use chunk::Chunk;
pub use config::TreeConfig;
pub use edit::{Edit, EditError};
pub use eol::{EolStats, LineEnding};
pub use invariants::InvariantViolation;

use piece::Piece;
use tree::Tree;

/// A 1-based line and column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("line {line} is out of range (document has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },
    #[error("column {column} is out of range for line {line} (max column {max_column})")]
    ColumnOutOfRange {
        line: usize,
        column: usize,
        max_column: usize,
    },
    #[error("offset {offset} is out of range for a document of {len} bytes")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
    #[error("range start {start} is past its end {end}")]
    ReversedRange { start: usize, end: usize },
}

#[derive(Debug, Clone, Default)]
pub struct PieceTree {
    tree: Tree,
    config: TreeConfig,
}

impl PieceTree {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self::from_chunks(chunks, TreeConfig::default())
    }

    /// Bulk-build a balanced tree with one piece per non-empty chunk.
    pub fn from_chunks(chunks: Vec<Chunk>, config: TreeConfig) -> Self {
        let mut pieces: Vec<Piece> = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            if chunk.is_empty() {
                continue;
            }
            let len = chunk.len();
            let mut piece = Piece::from_parts(chunk.text, 0, len, chunk.line_starts);

            if piece.starts_with_lf() && pieces.last().is_some_and(Piece::ends_with_cr) {
                // a CR/LF pair across chunks gets a piece of its own
                if let Some(prev) = pieces.pop()
                    && prev.len() > 1
                {
                    pieces.push(prev.split_at(prev.len() - 1).0);
                }
                pieces.push(Piece::from_text("\r\n"));
                if piece.len() == 1 {
                    continue;
                }
                piece = piece.split_at(1).1;
            }
            pieces.push(piece);
        }

        let tree = Tree::from_pieces(pieces);
        debug!(
            pieces = tree.node_count(),
            len = tree.len(),
            min_piece_len = config.min_piece_len,
            max_piece_len = config.max_piece_len,
            "built piece tree"
        );
        Self { tree, config }
    }

    pub fn config(&self) -> TreeConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn line_count(&self) -> usize {
        self.tree.line_break_count() + 1
    }

    /// Number of pieces currently in the tree.
    pub fn piece_count(&self) -> usize {
        self.tree.node_count()
    }

    pub fn get_text(&self) -> String {
        let mut text = String::with_capacity(self.len());
        for id in self.tree.iter() {
            text.push_str(self.tree.piece(id).text());
        }
        text
    }

    /// Text between two byte offsets.
    pub fn get_value_in_range(&self, start: usize, end: usize) -> Result<String, PositionError> {
        if start > end {
            return Err(PositionError::ReversedRange { start, end });
        }
        let len = self.len();
        for offset in [start, end] {
            if offset > len {
                return Err(PositionError::OffsetOutOfRange { offset, len });
            }
            if !self.is_char_boundary(offset) {
                return Err(PositionError::NotCharBoundary { offset });
            }
        }
        Ok(self.collect_range(start..end))
    }

    /// Every line, terminators included. Always at least one entry.
    pub fn get_lines_content(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.line_count());
        let mut current = String::new();

        for id in self.tree.iter() {
            let piece = self.tree.piece(id);
            let text = piece.text();
            let mut prev = 0;
            for &line_start in piece.line_starts() {
                current.push_str(&text[prev..line_start]);
                lines.push(std::mem::take(&mut current));
                prev = line_start;
            }
            current.push_str(&text[prev..]);
        }

        lines.push(current);
        lines
    }

    /// Content of a 1-based line, terminator included.
    pub fn get_line_content(&self, line: usize) -> Result<String, PositionError> {
        let range = self.line_range(line)?;
        Ok(self.collect_range(range))
    }

    /// Length of a line without its terminator.
    pub fn get_line_length(&self, line: usize) -> Result<usize, PositionError> {
        let range = self.line_range(line)?;
        Ok(range.len() - self.terminator_len(&range))
    }

    pub fn get_line_max_column(&self, line: usize) -> Result<usize, PositionError> {
        Ok(self.get_line_length(line)? + 1)
    }

    /// Byte offset of a 1-based line and column. The column may point just
    /// past the line's content, but not into its terminator.
    pub fn get_offset_at(&self, line: usize, column: usize) -> Result<usize, PositionError> {
        let max_column = self.get_line_max_column(line)?;
        if column == 0 || column > max_column {
            return Err(PositionError::ColumnOutOfRange {
                line,
                column,
                max_column,
            });
        }
        Ok(self.line_start(line) + column - 1)
    }

    pub fn get_position_at(&self, offset: usize) -> Result<Position, PositionError> {
        let len = self.len();
        if offset > len {
            return Err(PositionError::OffsetOutOfRange { offset, len });
        }
        let line = self.tree.breaks_before(offset) + 1;
        Ok(Position::new(line, offset - self.line_start(line) + 1))
    }

    fn line_range(&self, line: usize) -> Result<Range<usize>, PositionError> {
        let line_count = self.line_count();
        if line == 0 || line > line_count {
            return Err(PositionError::LineOutOfRange { line, line_count });
        }
        let end = if line == line_count {
            self.len()
        } else {
            self.line_start(line + 1)
        };
        Ok(self.line_start(line)..end)
    }

    fn line_start(&self, line: usize) -> usize {
        if line <= 1 {
            return 0;
        }
        match self.tree.locate_by_line(line - 1) {
            Some((id, node_start, idx)) => node_start + self.tree.piece(id).line_starts()[idx],
            None => self.len(),
        }
    }

    fn terminator_len(&self, range: &Range<usize>) -> usize {
        if range.is_empty() {
            return 0;
        }
        match self.byte_at(range.end - 1) {
            Some(b'\n') if range.len() >= 2 && self.byte_at(range.end - 2) == Some(b'\r') => 2,
            Some(b'\n' | b'\r') => 1,
            _ => 0,
        }
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        let (id, node_start) = self.tree.locate_by_offset(offset)?;
        self.tree
            .piece(id)
            .text()
            .as_bytes()
            .get(offset - node_start)
            .copied()
    }

    fn collect_range(&self, range: Range<usize>) -> String {
        let mut out = String::with_capacity(range.len());
        if range.is_empty() {
            return out;
        }
        let Some((mut id, node_start)) = self.tree.locate_by_offset(range.start) else {
            return out;
        };

        let mut skip = range.start - node_start;
        let mut remaining = range.len();
        loop {
            let text = self.tree.piece(id).text();
            let take = (text.len() - skip).min(remaining);
            out.push_str(&text[skip..skip + take]);
            remaining -= take;
            skip = 0;

            if remaining == 0 {
                break;
            }
            match self.tree.next(id) {
                Some(next) => id = next,
                None => break,
            }
        }
        out
    }
}

impl From<&str> for PieceTree {
    fn from(text: &str) -> Self {
        Self::new(vec![Chunk::from(text)])
    }
}

impl fmt::Display for PieceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.tree.iter() {
            f.write_str(self.tree.piece(id).text())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_basic_unix() {
        let tree = PieceTree::new(vec![Chunk::from("Hello\nWorld")]);

        let lines = tree.get_lines_content();
        assert_eq!(lines, vec!["Hello\n", "World"]);

        assert_eq!(tree.get_line_content(1).unwrap(), "Hello\n");
        assert_eq!(tree.get_line_content(2).unwrap(), "World");
        assert_eq!(
            tree.get_line_content(3),
            Err(PositionError::LineOutOfRange {
                line: 3,
                line_count: 2
            })
        );
    }

    #[test]
    fn lines_crlf_single_buffer() {
        // Contains Windows-style CRLF newlines
        let tree = PieceTree::from("abc\r\ndef\r\nxyz");

        let lines = tree.get_lines_content();
        assert_eq!(lines, vec!["abc\r\n", "def\r\n", "xyz"]);
        assert_eq!(tree.get_line_length(1).unwrap(), 3);
        assert_eq!(tree.get_line_content(3).unwrap(), "xyz");
        assert!(tree.get_line_content(0).is_err());
    }

    #[test]
    fn lines_multiple_chunks() {
        let tree = PieceTree::new(vec![Chunk::from("foo\n"), Chunk::from("bar\nbaz")]);

        let lines = tree.get_lines_content();
        assert_eq!(lines, vec!["foo\n", "bar\n", "baz"]);
        assert_eq!(tree.get_line_content(2).unwrap(), "bar\n");
        assert_eq!(tree.piece_count(), 2);
    }

    #[test]
    fn lines_trailing_newline() {
        // Ensure trailing newline yields final empty line
        let tree = PieceTree::from("a\nb\n");

        let lines = tree.get_lines_content();
        assert_eq!(lines, vec!["a\n", "b\n", ""]);
        assert_eq!(tree.get_line_content(3).unwrap(), "");
        assert_eq!(tree.get_line_length(3).unwrap(), 0);
    }

    #[test]
    fn lone_cr_has_an_empty_line_after_it() {
        let tree = PieceTree::from("\r");
        assert_eq!(tree.line_count(), 2);
        assert_eq!(tree.get_line_content(1).unwrap(), "\r");
        assert_eq!(tree.get_line_content(2).unwrap(), "");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn crlf_across_chunks_is_one_break() {
        let tree = PieceTree::new(vec![
            Chunk::from("ab\r"),
            Chunk::from("\n"),
            Chunk::from(""),
            Chunk::from("\r"),
            Chunk::from("\ncd"),
        ]);
        assert_eq!(tree.get_text(), "ab\r\n\r\ncd");
        assert_eq!(tree.get_lines_content(), vec!["ab\r\n", "\r\n", "cd"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn empty_document() {
        let tree = PieceTree::default();
        assert!(tree.is_empty());
        assert_eq!(tree.line_count(), 1);
        assert_eq!(tree.get_lines_content(), vec![""]);
        assert_eq!(tree.get_line_content(1).unwrap(), "");
        assert_eq!(tree.get_offset_at(1, 1), Ok(0));
        assert_eq!(tree.get_position_at(0), Ok(Position::new(1, 1)));
    }

    #[test]
    fn offsets_and_positions() {
        let tree = PieceTree::new(vec![Chunk::from("ab\r\nc"), Chunk::from("d\re\n")]);
        // lines: "ab\r\n", "cd\r", "e\n", ""
        assert_eq!(tree.line_count(), 4);
        assert_eq!(tree.get_offset_at(1, 3), Ok(2));
        assert_eq!(tree.get_offset_at(2, 1), Ok(4));
        assert_eq!(tree.get_offset_at(2, 3), Ok(6));
        assert_eq!(tree.get_offset_at(4, 1), Ok(9));
        assert_eq!(
            tree.get_offset_at(1, 4),
            Err(PositionError::ColumnOutOfRange {
                line: 1,
                column: 4,
                max_column: 3
            })
        );

        assert_eq!(tree.get_position_at(0), Ok(Position::new(1, 1)));
        assert_eq!(tree.get_position_at(4), Ok(Position::new(2, 1)));
        assert_eq!(tree.get_position_at(7), Ok(Position::new(3, 1)));
        assert_eq!(tree.get_position_at(9), Ok(Position::new(4, 1)));
        assert!(tree.get_position_at(10).is_err());

        for offset in 0..=tree.len() {
            let pos = tree.get_position_at(offset).unwrap();
            if pos.column <= tree.get_line_max_column(pos.line).unwrap() {
                assert_eq!(tree.get_offset_at(pos.line, pos.column), Ok(offset));
            }
        }
    }

    #[test]
    fn value_in_range_spans_pieces() {
        let tree = PieceTree::new(vec![Chunk::from("héllo "), Chunk::from("wörld")]);
        assert_eq!(tree.get_value_in_range(1, 10).unwrap(), "éllo wö");
        assert_eq!(
            tree.get_value_in_range(2, 4),
            Err(PositionError::NotCharBoundary { offset: 2 })
        );
        assert!(tree.get_value_in_range(0, 100).is_err());
        assert_eq!(tree.to_string(), "héllo wörld");
    }

    #[test]
    fn reversed_range_is_rejected() {
        let tree = PieceTree::from("hello world");
        assert_eq!(
            tree.get_value_in_range(8, 2),
            Err(PositionError::ReversedRange { start: 8, end: 2 })
        );
        assert_eq!(tree.get_value_in_range(4, 4).unwrap(), "");
    }
}
